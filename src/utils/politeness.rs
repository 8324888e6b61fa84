// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::config::settings::PolitenessSettings;
use crate::utils::rate_limiter::TokenBucket;
use crate::utils::robots::RobotsChecker;

/// 礼貌性门控
///
/// 组合 robots 规则检查与令牌桶限速，所有针对目标站点的出站
/// 抓取都必须先经过本组件。整个进程内共享一个实例，
/// 由构造方显式注入到各个调用方。
pub struct PolitenessGate {
    /// Robots.txt检查器
    robots: RobotsChecker,

    /// 令牌桶限速器
    bucket: TokenBucket,

    /// 取得令牌后附加的随机延迟下限
    delay_min: Duration,

    /// 取得令牌后附加的随机延迟上限
    delay_max: Duration,
}

impl PolitenessGate {
    /// 创建新的礼貌性门控实例
    ///
    /// # 参数
    ///
    /// * `settings` - 礼貌性配置
    /// * `user_agent` - 本爬虫的 User-Agent 字符串
    ///
    /// # 返回值
    ///
    /// 返回新的礼貌性门控实例
    pub fn new(settings: &PolitenessSettings, user_agent: &str) -> Self {
        Self {
            robots: RobotsChecker::new(user_agent.to_string()),
            bucket: TokenBucket::new(settings.requests_per_minute),
            delay_min: Duration::from_millis(settings.request_delay_min_ms),
            delay_max: Duration::from_millis(settings.request_delay_max_ms),
        }
    }

    /// 检查URL是否被robots规则允许
    ///
    /// 规则获取失败时默认放行，本调用从不报错。
    pub async fn allowed(&self, url: &str) -> bool {
        self.robots.allowed(url).await
    }

    /// 等待直到允许发起下一次请求
    ///
    /// 先从令牌桶取得一个令牌（不足时挂起等待补充），随后在
    /// 配置的区间内随机附加一段延迟以打散请求节奏。
    /// 等待时间有限，本调用从不失败。
    pub async fn throttle(&self) {
        self.bucket.acquire().await;

        let extra = if self.delay_max > self.delay_min {
            let min = self.delay_min.as_millis() as u64;
            let max = self.delay_max.as_millis() as u64;
            Duration::from_millis(rand::random_range(min..=max))
        } else {
            self.delay_min
        };

        if !extra.is_zero() {
            tokio::time::sleep(extra).await;
        }
    }
}
