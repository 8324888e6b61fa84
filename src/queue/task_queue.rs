// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::ScrapeTask;
use crate::infrastructure::cache::redis_client::RedisClient;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 队列后端错误
    #[error("Queue backend error: {0}")]
    Backend(#[from] anyhow::Error),

    /// 任务载荷无法解析
    #[error("Invalid task payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// 任务队列特质
///
/// 抓取任务的投递通道。投递语义（重投递、可见性超时）由队列
/// 后端负责，核心逻辑只生产和消费任务载荷。
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 入队任务
    async fn enqueue(&self, task: &ScrapeTask) -> Result<(), QueueError>;

    /// 出队任务
    ///
    /// 队列为空时返回 `Ok(None)`，由调用方决定轮询节奏。
    async fn dequeue(&self) -> Result<Option<ScrapeTask>, QueueError>;

    /// 待处理任务数
    async fn len(&self) -> Result<u64, QueueError>;
}

/// Redis列表任务队列实现
///
/// 以 `LPUSH`/`RPOP` 实现先进先出的任务投递。
pub struct RedisTaskQueue {
    /// Redis客户端
    redis: RedisClient,
    /// 队列使用的键
    queue_key: String,
}

impl RedisTaskQueue {
    /// 创建新的Redis任务队列实例
    ///
    /// # 参数
    ///
    /// * `redis` - Redis客户端
    /// * `queue_key` - 队列使用的键
    ///
    /// # 返回值
    ///
    /// 返回新的Redis任务队列实例
    pub fn new(redis: RedisClient, queue_key: String) -> Self {
        Self { redis, queue_key }
    }
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    async fn enqueue(&self, task: &ScrapeTask) -> Result<(), QueueError> {
        let payload = serde_json::to_string(task)?;
        self.redis.lpush(&self.queue_key, &payload).await?;
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<ScrapeTask>, QueueError> {
        let Some(payload) = self.redis.rpop(&self.queue_key).await? else {
            return Ok(None);
        };
        let task = serde_json::from_str(&payload)?;
        Ok(Some(task))
    }

    async fn len(&self) -> Result<u64, QueueError> {
        let len = self.redis.llen(&self.queue_key).await?;
        Ok(len)
    }
}

#[async_trait]
impl<T: TaskQueue + ?Sized> TaskQueue for Arc<T> {
    async fn enqueue(&self, task: &ScrapeTask) -> Result<(), QueueError> {
        (**self).enqueue(task).await
    }

    async fn dequeue(&self) -> Result<Option<ScrapeTask>, QueueError> {
        (**self).dequeue().await
    }

    async fn len(&self) -> Result<u64, QueueError> {
        (**self).len().await
    }
}
