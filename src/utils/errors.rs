// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::RepositoryError;
use crate::queue::task_queue::QueueError;
use thiserror::Error;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    /// 任务出队或入队失败
    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),

    /// 仓库访问失败
    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    /// 其他内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}
