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

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::models::scrape_job::ScrapeTargetType;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::services::batch_persistence::BatchPersister;
use crate::domain::services::crawl_service::CategoryCrawler;
use crate::domain::services::job_tracker::JobTracker;
use crate::queue::task_queue::TaskQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 队列为空时的轮询间隔
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 目录抓取工作者
///
/// 每个工作者一次只处理一个分类任务，分类内部逐页顺序抓取。
/// 多个工作者可以并发处理不同分类，对目标站点的总节奏由共享
/// 的礼貌性门控约束。
pub struct CatalogScrapeWorker<Q, P, J>
where
    Q: TaskQueue,
    P: ProductRepository,
    J: ScrapeJobRepository,
{
    /// 任务队列
    queue: Arc<Q>,
    /// 分类抓取编排器
    crawler: Arc<CategoryCrawler>,
    /// 批量持久化协调器
    persister: Arc<BatchPersister<P>>,
    /// 作业追踪器
    tracker: Arc<JobTracker<J>>,
    /// 工作者标识
    worker_id: Uuid,
}

impl<Q, P, J> CatalogScrapeWorker<Q, P, J>
where
    Q: TaskQueue,
    P: ProductRepository,
    J: ScrapeJobRepository,
{
    /// 创建新的目录抓取工作者实例
    pub fn new(
        queue: Arc<Q>,
        crawler: Arc<CategoryCrawler>,
        persister: Arc<BatchPersister<P>>,
        tracker: Arc<JobTracker<J>>,
    ) -> Self {
        Self {
            queue,
            crawler,
            persister,
            tracker,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 处理下一个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 处理了一个任务
    /// * `Ok(false)` - 队列为空
    async fn process_next_task(&self) -> Result<bool, WorkerError> {
        let Some(task) = self.queue.dequeue().await? else {
            return Ok(false);
        };

        info!(
            "Worker {} picked up category task {} ({})",
            self.worker_id, task.slug, task.url
        );

        let crawler = self.crawler.clone();
        let persister = self.persister.clone();
        let url = task.url.clone();
        let slug = task.slug.clone();
        let category_id = task.category_id;
        let max_pages = task.max_pages;

        let outcome = self
            .tracker
            .track(&task.url, ScrapeTargetType::Category, || async move {
                let result = crawler
                    .scrape_category(&url, max_pages, move |products, progress| {
                        let persister = persister.clone();
                        let slug = slug.clone();
                        async move {
                            persister
                                .persist_batch(category_id, &slug, &products, progress)
                                .await
                        }
                    })
                    .await;
                Ok(result)
            })
            .await;

        // 作业成败都要清理进度快照
        self.persister.finish(&task.slug).await;

        match outcome {
            Ok(result) => info!(
                "Category task {} done: {} pages, {} items, {} page errors",
                task.slug,
                result.pages_scraped,
                result.total_items,
                result.errors.len()
            ),
            // 整个作业的重试由队列层决定，这里只记录
            Err(e) => error!("Category task {} failed: {}", task.slug, e),
        }

        Ok(true)
    }
}

#[async_trait]
impl<Q, P, J> Worker for CatalogScrapeWorker<Q, P, J>
where
    Q: TaskQueue + 'static,
    P: ProductRepository + 'static,
    J: ScrapeJobRepository + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Catalog scrape worker {} started", self.worker_id);

        loop {
            match self.process_next_task().await {
                Ok(processed) => {
                    if !processed {
                        sleep(IDLE_POLL_INTERVAL).await;
                    }
                }
                Err(e) => {
                    error!("Error processing task: {}", e);
                    sleep(IDLE_POLL_INTERVAL).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "catalog_scrape_worker"
    }
}
