// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::models::catalog::ItemCount;
use crate::domain::models::scrape_job::{ScrapeJob, ScrapeTargetType};
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;

/// 作业追踪器
///
/// 把任意顶层抓取动作包裹进一条持久化的作业记录：执行前创建
/// 记录，随后恰好写入一次终态（成功附带耗时与条目数，失败附带
/// 耗时与错误信息并把错误重新抛给调用方）。分类抓取内部的
/// 逐页操作不单独追踪。
pub struct JobTracker<R: ScrapeJobRepository> {
    /// 作业仓库
    repository: Arc<R>,
}

impl<R: ScrapeJobRepository> JobTracker<R> {
    /// 创建新的作业追踪器实例
    ///
    /// # 参数
    ///
    /// * `repository` - 作业仓库
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// 以作业记录包裹一次抓取动作
    ///
    /// # 参数
    ///
    /// * `target_url` - 目标URL
    /// * `target_type` - 目标类型
    /// * `op` - 待执行的抓取动作
    ///
    /// # 返回值
    ///
    /// * `Ok(T)` - 抓取动作的结果，作业记录为 Completed
    /// * `Err` - 抓取动作的原始错误，作业记录为 Failed
    pub async fn track<T, F, Fut>(
        &self,
        target_url: &str,
        target_type: ScrapeTargetType,
        op: F,
    ) -> Result<T>
    where
        T: ItemCount,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let job = ScrapeJob::new(target_url.to_string(), target_type);
        self.repository
            .create(&job)
            .await
            .context("failed to create scrape job record")?;

        let job_id = job.id;
        let job = job
            .start()
            .context("failed to transition scrape job to running")?;

        match op().await {
            Ok(value) => {
                let items = value.item_count();
                match job.complete(items) {
                    Ok(finished) => self.finalize(&finished).await,
                    Err(e) => error!("Job {} completion transition rejected: {}", job_id, e),
                }
                info!("Job {} completed with {} items", job_id, items);
                Ok(value)
            }
            Err(err) => {
                match job.fail(err.to_string()) {
                    Ok(finished) => self.finalize(&finished).await,
                    Err(e) => error!("Job {} failure transition rejected: {}", job_id, e),
                }
                error!("Job {} failed: {}", job_id, err);
                Err(err)
            }
        }
    }

    /// 写入作业终态
    ///
    /// 终态写入失败只记录日志，不掩盖抓取动作本身的结果。
    async fn finalize(&self, job: &ScrapeJob) {
        if let Err(e) = self.repository.finalize(job).await {
            error!("Failed to persist terminal state for job {}: {}", job.id, e);
        }
    }
}
