// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 集成测试辅助模块
//!
//! 提供脚本化浏览器引擎与内存仓库等测试替身，
//! 让编排逻辑可以在不接触真实浏览器和数据库的情况下测试。

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;
use uuid::Uuid;

use bookrs::config::settings::{CrawlerSettings, PolitenessSettings, SelectorSettings};
use bookrs::domain::models::catalog::{PageProgress, ScrapedCategory, ScrapedProduct};
use bookrs::domain::models::scrape_job::ScrapeJob;
use bookrs::domain::repositories::category_repository::CategoryRepository;
use bookrs::domain::repositories::product_repository::ProductRepository;
use bookrs::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use bookrs::domain::repositories::RepositoryError;
use bookrs::domain::services::batch_persistence::ProgressStore;
use bookrs::domain::services::crawl_service::CategoryCrawler;
use bookrs::domain::services::extraction::PageExtractor;
use bookrs::engines::traits::{BrowserEngine, EngineError, PageRequest};
use bookrs::utils::politeness::PolitenessGate;
use bookrs::utils::retry_policy::RetryPolicy;

/// 脚本化浏览器引擎
///
/// 按URL返回预先注入的HTML，未注入的URL返回导航失败。
/// 记录每次请求以便断言抓取访问了哪些页面。
#[derive(Default)]
pub struct ScriptedEngine {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注入一个URL对应的页面HTML
    pub fn script(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    /// 已收到的请求URL列表
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserEngine for ScriptedEngine {
    async fn fetch_page(&self, request: &PageRequest) -> Result<String, EngineError> {
        self.requests.lock().unwrap().push(request.url.clone());
        self.pages
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| {
                EngineError::NavigationFailed(format!("no scripted page for {}", request.url))
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// 内存商品仓库
///
/// 以 `source_id` 为键模拟upsert语义，可开关写入失败
/// 以测试批量持久化的失败策略。
#[derive(Default)]
pub struct MemoryProductRepository {
    products: Mutex<HashMap<String, (i32, ScrapedProduct)>>,
    fail_writes: AtomicBool,
}

impl MemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<ScrapedProduct> {
        self.products
            .lock()
            .unwrap()
            .values()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn upsert_batch(
        &self,
        category_id: i32,
        products: &[ScrapedProduct],
    ) -> Result<u64, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sea_orm::DbErr::Custom(
                "injected write failure".to_string(),
            )));
        }

        let mut map = self.products.lock().unwrap();
        for product in products {
            map.insert(product.source_id.clone(), (category_id, product.clone()));
        }
        Ok(products.len() as u64)
    }

    async fn count_by_category(&self, category_id: i32) -> Result<u64, RepositoryError> {
        let map = self.products.lock().unwrap();
        Ok(map.values().filter(|(c, _)| *c == category_id).count() as u64)
    }
}

/// 内存分类仓库
#[derive(Default)]
pub struct MemoryCategoryRepository {
    categories: Mutex<HashMap<String, ScrapedCategory>>,
}

impl MemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.categories.lock().unwrap().keys().cloned().collect();
        slugs.sort();
        slugs
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn upsert_tree(&self, categories: &[ScrapedCategory]) -> Result<u64, RepositoryError> {
        let mut map = self.categories.lock().unwrap();
        let mut written = 0u64;
        for root in categories {
            map.insert(root.slug.clone(), root.clone());
            written += 1;
            for child in &root.children {
                map.insert(child.slug.clone(), child.clone());
                written += 1;
            }
        }
        Ok(written)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.categories.lock().unwrap().len() as u64)
    }
}

/// 内存作业仓库
///
/// 记录作业的创建与终态写入，供断言作业生命周期。
#[derive(Default)]
pub struct MemoryJobRepository {
    jobs: Mutex<HashMap<Uuid, ScrapeJob>>,
    created: Mutex<Vec<Uuid>>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_ids(&self) -> Vec<Uuid> {
        self.created.lock().unwrap().clone()
    }

    /// 唯一一条作业记录，测试中作业数恒为1时使用
    pub fn single_job(&self) -> ScrapeJob {
        let jobs = self.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1, "expected exactly one job record");
        jobs.values().next().unwrap().clone()
    }
}

#[async_trait]
impl ScrapeJobRepository for MemoryJobRepository {
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        self.created.lock().unwrap().push(job.id);
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn finalize(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }
}

/// 内存进度快照存储
#[derive(Default)]
pub struct MemoryProgressStore {
    snapshots: Mutex<HashMap<String, PageProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn write(&self, slug: &str, progress: PageProgress) -> anyhow::Result<()> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(slug.to_string(), progress);
        Ok(())
    }

    async fn read(&self, slug: &str) -> anyhow::Result<Option<PageProgress>> {
        Ok(self.snapshots.lock().unwrap().get(slug).copied())
    }

    async fn clear(&self, slug: &str) -> anyhow::Result<()> {
        self.snapshots.lock().unwrap().remove(slug);
        Ok(())
    }
}

/// 测试用抓取器配置，页间零延迟、短超时
pub fn fast_crawler_settings() -> CrawlerSettings {
    CrawlerSettings {
        max_pages_per_category: 0,
        page_delay_min_ms: 0,
        page_delay_max_ms: 0,
        navigation_timeout_secs: 5,
        category_timeout_secs: 5,
        product_timeout_secs: 5,
    }
}

/// 测试用重试策略，退避极短且无抖动
pub fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: std::time::Duration::from_millis(1),
        max_backoff: std::time::Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
        enable_jitter: false,
    }
}

/// 测试用礼貌性门控，额度宽松到不会产生等待
pub fn permissive_gate() -> Arc<PolitenessGate> {
    let settings = PolitenessSettings {
        requests_per_minute: 6000,
        request_delay_min_ms: 0,
        request_delay_max_ms: 0,
    };
    Arc::new(PolitenessGate::new(&settings, "bookrs-bot/1.0"))
}

/// 组装一个针对脚本化引擎的分类抓取编排器
pub fn scripted_crawler(engine: Arc<ScriptedEngine>, base_url: &str) -> CategoryCrawler {
    let extractor = Arc::new(PageExtractor::new(
        SelectorSettings::default(),
        Url::parse(base_url).unwrap(),
    ));
    CategoryCrawler::new(
        engine,
        permissive_gate(),
        extractor,
        fast_crawler_settings(),
        fast_retry_policy(2),
    )
}

/// 生成一个带指定商品卡片的分类列表页
///
/// `count_label` 注入页面正文，供分页估算的文本启发式识别。
pub fn listing_page(count_label: Option<&str>, products: &[(&str, &str)]) -> String {
    let mut body = String::new();
    if let Some(label) = count_label {
        body.push_str(&format!("<p>{}</p>\n", label));
    }
    for (slug, title) in products {
        body.push_str(&format!(
            r#"<div class="product-card">
                <h2 class="product-title"><a href="/books/{}">{}</a></h2>
                <div class="price"><span class="amount">$9.99</span></div>
            </div>
"#,
            slug, title
        ));
    }
    format!("<html><body>\n{}</body></html>", body)
}

/// 构造一个有效的商品记录
pub fn product(source_id: &str, title: &str) -> ScrapedProduct {
    ScrapedProduct {
        source_id: source_id.to_string(),
        title: title.to_string(),
        author: None,
        price: 9.99,
        original_price: None,
        image_url: None,
        source_url: format!("https://books.example.com/books/{}", source_id),
        isbn: None,
        condition: None,
        publisher: None,
        available: true,
    }
}
