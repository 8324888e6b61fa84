// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 重试策略配置
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次执行）
    pub max_attempts: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 计算下次重试的退避时间
    ///
    /// # 参数
    ///
    /// * `attempt` - 已失败的尝试次数（从1开始）
    ///
    /// # 返回值
    ///
    /// 返回应用指数退避和抖动之后的等待时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        // 计算指数退避
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32 - 1);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        // 添加抖动，空区间（退避为零）直接跳过
        let jitter_range = capped_backoff * self.jitter_factor;
        let final_backoff = if self.enable_jitter && jitter_range > 0.0 {
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 是否应该继续重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// 按重试策略执行一个可失败的异步操作
///
/// 操作最多被调用 `max_attempts` 次，第一次执行前没有延迟。
/// 所有尝试耗尽后返回最后一次的错误。调用方需保证操作在
/// 下游是幂等的（重试可能在部分执行之后发生）。
///
/// # 参数
///
/// * `policy` - 重试策略
/// * `operation_name` - 操作名称，用于日志
/// * `op` - 待执行的异步操作
///
/// # 返回值
///
/// * `Ok(T)` - 任意一次尝试成功的结果
/// * `Err(E)` - 最后一次尝试的错误
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                let backoff = policy.calculate_backoff(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    operation_name, attempt, max_attempts, err, backoff
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
