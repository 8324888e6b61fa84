// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::catalog::PageProgress;
use crate::domain::services::batch_persistence::ProgressStore;
use crate::infrastructure::cache::redis_client::RedisClient;

/// 进度快照键前缀
const KEY_PREFIX: &str = "scrape:progress:";

/// Redis中的进度快照格式
#[derive(Debug, Serialize, Deserialize)]
struct ProgressSnapshot {
    /// 当前页码
    current: u32,
    /// 总页数
    total: u32,
    /// 快照写入时间
    updated_at: DateTime<Utc>,
}

/// Redis进度快照存储
///
/// 快照按分类别名存入Redis并带短过期时间，作业崩溃未清理时
/// 自动失效，因此读不到快照即代表没有进行中的抓取。
pub struct RedisProgressStore {
    /// Redis客户端
    redis: RedisClient,
    /// 快照过期时间（秒）
    ttl_seconds: u64,
}

impl RedisProgressStore {
    /// 创建新的Redis进度快照存储实例
    ///
    /// # 参数
    ///
    /// * `redis` - Redis客户端
    /// * `ttl_seconds` - 快照过期时间（秒）
    pub fn new(redis: RedisClient, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(slug: &str) -> String {
        format!("{}{}", KEY_PREFIX, slug)
    }
}

#[async_trait]
impl ProgressStore for RedisProgressStore {
    async fn write(&self, slug: &str, progress: PageProgress) -> Result<()> {
        let snapshot = ProgressSnapshot {
            current: progress.current,
            total: progress.total,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.redis
            .set(&Self::key(slug), &json, self.ttl_seconds)
            .await
    }

    async fn read(&self, slug: &str) -> Result<Option<PageProgress>> {
        let Some(json) = self.redis.get(&Self::key(slug)).await? else {
            return Ok(None);
        };
        let snapshot: ProgressSnapshot = serde_json::from_str(&json)?;
        Ok(Some(PageProgress {
            current: snapshot.current,
            total: snapshot.total,
        }))
    }

    async fn clear(&self, slug: &str) -> Result<()> {
        self.redis.delete(&Self::key(slug)).await
    }
}
