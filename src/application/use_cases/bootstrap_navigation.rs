// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::info;

use crate::domain::models::scrape_job::ScrapeTargetType;
use crate::domain::repositories::category_repository::CategoryRepository;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::services::crawl_service::CategoryCrawler;
use crate::domain::services::job_tracker::JobTracker;

/// 导航引导用例
///
/// 抓取站点导航菜单并把分类树持久化到存储。触发调用立即返回，
/// 抓取在显式派生的后台任务中进行，其成败通过返回的通道观察；
/// 调用方也可以轮询已持久化的分类数来判断引导是否完成。
pub struct NavigationBootstrap<C, J>
where
    C: CategoryRepository + 'static,
    J: ScrapeJobRepository + 'static,
{
    /// 分类抓取编排器
    crawler: Arc<CategoryCrawler>,
    /// 分类仓库
    categories: Arc<C>,
    /// 作业追踪器
    tracker: Arc<JobTracker<J>>,
}

impl<C, J> NavigationBootstrap<C, J>
where
    C: CategoryRepository + 'static,
    J: ScrapeJobRepository + 'static,
{
    /// 创建新的导航引导用例实例
    ///
    /// # 参数
    ///
    /// * `crawler` - 分类抓取编排器
    /// * `categories` - 分类仓库
    /// * `tracker` - 作业追踪器
    pub fn new(crawler: Arc<CategoryCrawler>, categories: Arc<C>, tracker: Arc<JobTracker<J>>) -> Self {
        Self {
            crawler,
            categories,
            tracker,
        }
    }

    /// 触发导航引导
    ///
    /// 立即返回一个接收端，后台任务完成后可从中取得持久化的
    /// 分类总数或失败原因。接收端被丢弃不影响后台任务执行。
    ///
    /// # 参数
    ///
    /// * `nav_url` - 站点导航页URL
    pub fn trigger(&self, nav_url: String) -> oneshot::Receiver<Result<u64>> {
        let (tx, rx) = oneshot::channel();

        let crawler = self.crawler.clone();
        let categories = self.categories.clone();
        let tracker = self.tracker.clone();

        tokio::spawn(async move {
            let tracked = tracker
                .track(&nav_url, ScrapeTargetType::Navigation, || async {
                    let scraped = crawler.scrape_navigation(&nav_url).await?;
                    let written = categories.upsert_tree(&scraped).await?;
                    info!("Navigation bootstrap wrote {} categories", written);
                    Ok(scraped)
                })
                .await;

            let outcome = match tracked {
                Ok(_) => categories.count().await.map_err(anyhow::Error::from),
                Err(e) => Err(e),
            };

            // 触发方可能不关心结果，发送失败直接忽略
            let _ = tx.send(outcome);
        });

        rx
    }

    /// 已持久化的分类总数，供轮询方观察引导进度
    pub async fn persisted_count(&self) -> Result<u64> {
        Ok(self.categories.count().await?)
    }
}
