// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::scrape_job::ScrapeJob;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::scrape_job as job_entity;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 抓取作业仓库实现
pub struct ScrapeJobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapeJobRepositoryImpl {
    /// 创建新的抓取作业仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的抓取作业仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScrapeJobRepository for ScrapeJobRepositoryImpl {
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        let model = job_entity::ActiveModel {
            id: Set(job.id),
            target_url: Set(job.target_url.clone()),
            target_type: Set(job.target_type.to_string()),
            status: Set(job.status.to_string()),
            started_at: Set(job.started_at),
            finished_at: Set(job.finished_at),
            duration_ms: Set(job.duration_ms),
            items_found: Set(job.items_found),
            error_log: Set(job.error_log.clone()),
            created_at: Set(job.created_at),
        };

        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    /// 写入作业终态
    ///
    /// `start()` 会刷新实际开始时间，因此一并更新。
    async fn finalize(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        let model = job_entity::ActiveModel {
            id: Set(job.id),
            status: Set(job.status.to_string()),
            started_at: Set(job.started_at),
            finished_at: Set(job.finished_at),
            duration_ms: Set(job.duration_ms),
            items_found: Set(job.items_found),
            error_log: Set(job.error_log.clone()),
            ..Default::default()
        };

        model.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        match model {
            Some(m) => {
                let target_type = m.target_type.parse().map_err(|_| {
                    RepositoryError::Database(DbErr::Custom("Invalid target type".to_string()))
                })?;
                let status = m.status.parse().map_err(|_| {
                    RepositoryError::Database(DbErr::Custom("Invalid job status".to_string()))
                })?;

                Ok(Some(ScrapeJob {
                    id: m.id,
                    target_url: m.target_url,
                    target_type,
                    status,
                    started_at: m.started_at,
                    finished_at: m.finished_at,
                    duration_ms: m.duration_ms,
                    items_found: m.items_found,
                    error_log: m.error_log,
                    created_at: m.created_at,
                }))
            }
            None => Ok(None),
        }
    }
}
