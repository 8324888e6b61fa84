// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::services::batch_persistence::BatchPersister;
use crate::domain::services::crawl_service::CategoryCrawler;
use crate::domain::services::job_tracker::JobTracker;
use crate::queue::task_queue::TaskQueue;
use crate::workers::catalog_worker::CatalogScrapeWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager<Q, P, J>
where
    Q: TaskQueue + 'static,
    P: ProductRepository + 'static,
    J: ScrapeJobRepository + 'static,
{
    queue: Arc<Q>,
    crawler: Arc<CategoryCrawler>,
    persister: Arc<BatchPersister<P>>,
    tracker: Arc<JobTracker<J>>,
    handles: Vec<JoinHandle<()>>,
}

impl<Q, P, J> WorkerManager<Q, P, J>
where
    Q: TaskQueue + 'static,
    P: ProductRepository + 'static,
    J: ScrapeJobRepository + 'static,
{
    /// 创建新的工作管理器实例
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
            handles: Vec::new(),
        }
    }

    /// 启动指定数量的抓取工作器
    ///
    /// 每个工作器在独立的tokio任务中运行自己的取任务循环。
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作器数量
    pub async fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = CatalogScrapeWorker::new(
                self.queue.clone(),
                self.crawler.clone(),
                self.persister.clone(),
                self.tracker.clone(),
            );

            self.handles.push(tokio::spawn(async move {
                let name = worker.name().to_string();
                if let Err(e) = worker.run().await {
                    error!("Worker {} exited with error: {}", name, e);
                }
            }));
        }
    }

    /// 等待关闭信号并停止全部工作器
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }

        info!("Workers shut down");
    }
}
