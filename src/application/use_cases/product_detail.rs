// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use std::sync::Arc;

use crate::domain::models::catalog::ScrapedProductDetail;
use crate::domain::models::scrape_job::ScrapeTargetType;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::services::crawl_service::CategoryCrawler;
use crate::domain::services::job_tracker::JobTracker;

/// 商品详情抓取用例
///
/// 以作业记录包裹单个商品详情页的抓取。
pub struct ProductDetailScrape<J>
where
    J: ScrapeJobRepository + 'static,
{
    /// 分类抓取编排器
    crawler: Arc<CategoryCrawler>,
    /// 作业追踪器
    tracker: Arc<JobTracker<J>>,
}

impl<J> ProductDetailScrape<J>
where
    J: ScrapeJobRepository + 'static,
{
    /// 创建新的商品详情抓取用例实例
    pub fn new(crawler: Arc<CategoryCrawler>, tracker: Arc<JobTracker<J>>) -> Self {
        Self { crawler, tracker }
    }

    /// 抓取商品详情
    ///
    /// # 参数
    ///
    /// * `url` - 商品详情页URL
    pub async fn run(&self, url: &str) -> Result<ScrapedProductDetail> {
        self.tracker
            .track(url, ScrapeTargetType::Product, || {
                self.crawler.scrape_product_detail(url)
            })
            .await
    }
}
