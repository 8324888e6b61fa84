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

use bookrs::application::use_cases::bootstrap_navigation::NavigationBootstrap;
use bookrs::config::settings::Settings;
use bookrs::domain::services::batch_persistence::{BatchFailurePolicy, BatchPersister};
use bookrs::domain::services::crawl_service::CategoryCrawler;
use bookrs::domain::services::extraction::PageExtractor;
use bookrs::domain::services::job_tracker::JobTracker;
use bookrs::engines::chromium_engine::ChromiumEngine;
use bookrs::engines::traits::BrowserEngine;
use bookrs::infrastructure::cache::progress_store::RedisProgressStore;
use bookrs::infrastructure::cache::redis_client::RedisClient;
use bookrs::infrastructure::database::connection;
use bookrs::infrastructure::repositories::category_repo_impl::CategoryRepositoryImpl;
use bookrs::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
use bookrs::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use bookrs::queue::task_queue::RedisTaskQueue;
use bookrs::utils::politeness::PolitenessGate;
use bookrs::utils::telemetry;
use bookrs::workers::manager::WorkerManager;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动抓取工作者
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting bookrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    let base_url = Url::parse(&settings.site.base_url)?;
    info!("Configuration loaded, target site: {}", base_url);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Redis Client
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    info!("Redis client initialized");

    // 5. Initialize the shared politeness gate
    //
    // 所有出站抓取共用这一个实例，限速与robots决策在此汇合。
    let gate = Arc::new(PolitenessGate::new(
        &settings.politeness,
        &settings.site.user_agent,
    ));

    // 6. Initialize browser engine and extraction pipeline
    let engine: Arc<dyn BrowserEngine> =
        Arc::new(ChromiumEngine::new(settings.site.user_agent.clone()));
    let extractor = Arc::new(PageExtractor::new(
        settings.selectors.clone(),
        base_url.clone(),
    ));
    let crawler = Arc::new(CategoryCrawler::new(
        engine,
        gate,
        extractor,
        settings.crawler.clone(),
        settings.retry.policy(),
    ));

    // 7. Initialize repositories and persistence coordinator
    let category_repo = Arc::new(CategoryRepositoryImpl::new(db.clone()));
    let product_repo = Arc::new(ProductRepositoryImpl::new(db.clone()));
    let job_repo = Arc::new(ScrapeJobRepositoryImpl::new(db));

    let progress_store = Arc::new(RedisProgressStore::new(
        redis_client.clone(),
        settings.persistence.progress_ttl_secs,
    ));
    let persister = Arc::new(BatchPersister::new(
        product_repo.clone(),
        progress_store,
        BatchFailurePolicy::from_config(&settings.persistence.batch_failure_policy),
    ));
    let tracker = Arc::new(JobTracker::new(job_repo));

    // 8. Bootstrap navigation when the catalog is empty
    //
    // 后台任务自行跑完，成败都会记成一条作业记录；主流程不等它。
    let bootstrap =
        NavigationBootstrap::new(crawler.clone(), category_repo.clone(), tracker.clone());
    match bootstrap.persisted_count().await {
        Ok(0) => {
            info!("No categories persisted yet, triggering navigation bootstrap");
            let _ = bootstrap.trigger(settings.site.base_url.clone());
        }
        Ok(count) => info!("Catalog already has {} categories", count),
        Err(e) => warn!("Could not check persisted category count: {}", e),
    }

    // 9. Start workers
    let queue = Arc::new(RedisTaskQueue::new(
        redis_client.clone(),
        settings.workers.queue_key.clone(),
    ));
    let mut worker_manager = WorkerManager::new(queue, crawler, persister, tracker);
    worker_manager.start_workers(settings.workers.count).await;
    info!("{} catalog workers started", settings.workers.count);

    // 10. Wait for shutdown signal
    worker_manager.wait_for_shutdown().await;

    Ok(())
}
