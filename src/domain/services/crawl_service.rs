// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::settings::CrawlerSettings;
use crate::domain::models::catalog::{
    PageProgress, ScrapeResult, ScrapedCategory, ScrapedProduct, ScrapedProductDetail,
};
use crate::domain::services::extraction::PageExtractor;
use crate::domain::services::pagination;
use crate::engines::traits::{BrowserEngine, EngineError, PageRequest};
use crate::utils::politeness::PolitenessGate;
use crate::utils::retry_policy::{with_retry, RetryPolicy};
use crate::utils::url_utils;

/// 分类抓取编排器
///
/// 驱动一个分类的完整多页抓取：首页加载后估算总页数，随后
/// 逐页顺序抓取（同一分类同时只有一页在途，以限制对目标站点
/// 的压力）。单页失败只记录错误并继续，整个分类的抓取从不
/// 因一页失败而中止。
pub struct CategoryCrawler {
    /// 浏览器引擎
    engine: Arc<dyn BrowserEngine>,
    /// 礼貌性门控，进程内共享
    gate: Arc<PolitenessGate>,
    /// 页面提取器
    extractor: Arc<PageExtractor>,
    /// 抓取器配置
    settings: CrawlerSettings,
    /// 页面加载的重试策略
    retry_policy: RetryPolicy,
}

impl CategoryCrawler {
    /// 创建新的分类抓取编排器实例
    ///
    /// # 参数
    ///
    /// * `engine` - 浏览器引擎
    /// * `gate` - 礼貌性门控
    /// * `extractor` - 页面提取器
    /// * `settings` - 抓取器配置
    /// * `retry_policy` - 页面加载的重试策略
    pub fn new(
        engine: Arc<dyn BrowserEngine>,
        gate: Arc<PolitenessGate>,
        extractor: Arc<PageExtractor>,
        settings: CrawlerSettings,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            engine,
            gate,
            extractor,
            settings,
            retry_policy,
        }
    }

    /// 抓取一个分类的全部分页
    ///
    /// 每成功完成一页且该页有商品时，调用一次增量批次回调并
    /// 附上 `{current, total}` 进度。回调失败与页面失败一样只
    /// 记录到错误列表。部分失败体现在返回结果的 `errors` 中，
    /// 本调用自身从不报错。
    ///
    /// # 参数
    ///
    /// * `url` - 分类列表页URL
    /// * `max_pages` - 本次调用的页数上限，覆盖配置值（0为不限制）
    /// * `on_batch` - 增量批次回调
    #[instrument(skip(self, on_batch), fields(url = %url))]
    pub async fn scrape_category<F, Fut>(
        &self,
        url: &str,
        max_pages: Option<u32>,
        mut on_batch: F,
    ) -> ScrapeResult<Vec<ScrapedProduct>>
    where
        F: FnMut(Vec<ScrapedProduct>, PageProgress) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        let mut result = ScrapeResult::default();

        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => {
                result.errors.push(format!("invalid category URL: {}", e));
                return result;
            }
        };

        // robots 禁止整个分类时不视为错误，产出空结果
        if !self.gate.allowed(url).await {
            warn!("Category URL disallowed by robots rules, skipping");
            return result;
        }

        let page_cap = max_pages.unwrap_or(self.settings.max_pages_per_category);
        let wait_selector = self.extractor.selectors().product_card.first().cloned();

        let mut page = 1u32;
        let mut total = 1u32;

        while page <= total {
            let page_url = url_utils::with_page_param(&base, page);

            match self
                .fetch_with_retry(
                    page_url.as_str(),
                    wait_selector.clone(),
                    self.settings.category_timeout(),
                    "category page",
                )
                .await
            {
                Ok(html) => {
                    // 总页数只在首页探测一次，之后保持不变
                    if page == 1 {
                        let detected = pagination::estimate_total_pages(
                            &html,
                            &self.extractor.selectors().pagination_controls,
                        );
                        total = if page_cap > 0 {
                            detected.min(page_cap)
                        } else {
                            detected
                        };
                        info!("Detected {} pages, scraping {}", detected, total);
                    }

                    let products = self.extractor.extract_products(&html);
                    result.pages_scraped += 1;
                    result.total_items += products.len() as u32;

                    let progress = PageProgress {
                        current: page,
                        total,
                    };

                    if !products.is_empty() {
                        if let Err(e) = on_batch(products.clone(), progress).await {
                            result
                                .errors
                                .push(format!("page {}: batch callback failed: {}", page, e));
                        }
                        result.data.extend(products);
                    }
                }
                Err(e) => {
                    warn!("Page {} failed after retries: {}", page, e);
                    result.errors.push(format!("page {}: {}", page, e));
                }
            }

            if page < total {
                self.inter_page_delay().await;
            }
            page += 1;
        }

        info!(
            "Category scrape finished: {} pages, {} items, {} errors",
            result.pages_scraped,
            result.total_items,
            result.errors.len()
        );
        result
    }

    /// 抓取站点导航菜单
    ///
    /// 失败耗尽重试后向调用方报错，由作业追踪记录为失败作业。
    /// robots 禁止时产出空菜单而不是错误。
    #[instrument(skip(self), fields(url = %url))]
    pub async fn scrape_navigation(&self, url: &str) -> Result<Vec<ScrapedCategory>> {
        if !self.gate.allowed(url).await {
            warn!("Navigation URL disallowed by robots rules, skipping");
            return Ok(Vec::new());
        }

        let wait_selector = self.extractor.selectors().nav_menu_item.first().cloned();
        let html = self
            .fetch_with_retry(
                url,
                wait_selector,
                self.settings.navigation_timeout(),
                "navigation page",
            )
            .await
            .context("navigation scrape failed")?;

        Ok(self.extractor.extract_navigation(&html))
    }

    /// 抓取单个商品详情页
    ///
    /// 详情页各区块都可能缺失，因此只等待导航完成而不等待
    /// 特定选择器。robots 禁止时产出空详情而不是错误。
    #[instrument(skip(self), fields(url = %url))]
    pub async fn scrape_product_detail(&self, url: &str) -> Result<ScrapedProductDetail> {
        if !self.gate.allowed(url).await {
            warn!("Product URL disallowed by robots rules, skipping");
            return Ok(ScrapedProductDetail::default());
        }

        let html = self
            .fetch_with_retry(url, None, self.settings.product_timeout(), "product page")
            .await
            .context("product detail scrape failed")?;

        Ok(self.extractor.extract_product_detail(&html))
    }

    /// 限速后加载页面，按重试策略重试
    async fn fetch_with_retry(
        &self,
        url: &str,
        wait_selector: Option<String>,
        timeout: Duration,
        operation_name: &str,
    ) -> Result<String, EngineError> {
        self.gate.throttle().await;

        let mut request = PageRequest::new(url, timeout);
        if let Some(selector) = wait_selector {
            request = request.wait_for(selector);
        }

        with_retry(&self.retry_policy, operation_name, || {
            self.engine.fetch_page(&request)
        })
        .await
    }

    /// 页间随机延迟，进一步打散对目标站点的请求节奏
    async fn inter_page_delay(&self) {
        let min = self.settings.page_delay_min_ms;
        let max = self.settings.page_delay_max_ms;
        let delay = if max > min {
            rand::random_range(min..=max)
        } else {
            min
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}
