// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// 令牌桶状态
#[derive(Debug)]
struct BucketState {
    /// 当前令牌数
    tokens: f64,
    /// 上次补充令牌的时间
    last_refill: Instant,
}

/// 令牌桶限速器
///
/// 容量与补充速率由每分钟请求数上限推导。令牌在每次调用时
/// 根据流逝的时间惰性补充，不依赖后台任务。同一目标站点的
/// 所有抓取活动共享一个实例，补充与消费在锁内完成，
/// 等待则在锁外挂起。
pub struct TokenBucket {
    /// 桶容量
    capacity: f64,
    /// 每秒补充的令牌数
    refill_per_sec: f64,
    /// 桶状态
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// 创建新的令牌桶实例
    ///
    /// # 参数
    ///
    /// * `requests_per_minute` - 每分钟请求数上限
    ///
    /// # 返回值
    ///
    /// 返回新的令牌桶实例
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = f64::from(requests_per_minute.max(1));
        Self {
            capacity,
            refill_per_sec: capacity / 60.0,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// 获取一个令牌，必要时挂起等待
    ///
    /// 若桶内不足一个令牌，则挂起至积累到一个令牌为止。
    /// 该调用可能阻塞有限长的时间，但从不失败。
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - state.tokens;
                    Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
                }
            };

            match wait {
                None => return,
                // 醒来后重新竞争令牌，可能被其他并发调用抢先
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }

    /// 当前可用令牌数（仅用于观测）
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
        state.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_capacity_does_not_wait() {
        let bucket = TokenBucket::new(20);
        let start = Instant::now();

        for _ in 0..20 {
            bucket.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exceeding_capacity_enforces_refill_wait() {
        // 20 请求/分钟：初始容量之外每个令牌需要 3 秒补充
        let bucket = TokenBucket::new(20);
        let start = Instant::now();

        for _ in 0..21 {
            bucket.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_cap_at_capacity() {
        let bucket = TokenBucket::new(10);
        bucket.acquire().await;

        // 长时间空闲后，令牌数不应超过容量
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(bucket.available() <= 10.0);
    }
}
