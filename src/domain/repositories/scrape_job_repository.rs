// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::ScrapeJob;
use crate::domain::repositories::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 抓取作业仓库特质
///
/// 定义作业记录的数据访问接口。作业记录只在创建后发生一次
/// 终态更新，保留策略由外部负责，核心逻辑从不删除。
#[async_trait]
pub trait ScrapeJobRepository: Send + Sync {
    /// 创建新作业记录
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError>;

    /// 写入作业终态
    ///
    /// 更新状态、结束时间、耗时、条目数与错误信息。
    async fn finalize(&self, job: &ScrapeJob) -> Result<(), RepositoryError>;

    /// 根据ID查找作业记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError>;
}
