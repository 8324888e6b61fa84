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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::utils::retry_policy::RetryPolicy;

/// 应用程序配置设置
///
/// 包含数据库、Redis、目标站点、抓取器、重试、礼貌性控制等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 目标站点配置
    pub site: SiteSettings,
    /// 抓取器配置
    pub crawler: CrawlerSettings,
    /// 重试配置
    pub retry: RetrySettings,
    /// 礼貌性控制配置
    pub politeness: PolitenessSettings,
    /// 批量持久化配置
    pub persistence: PersistenceSettings,
    /// Worker配置
    pub workers: WorkerSettings,
    /// 选择器配置
    pub selectors: SelectorSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 目标站点配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    /// 站点基础URL，相对链接据此解析
    pub base_url: String,
    /// 出站请求使用的 User-Agent
    pub user_agent: String,
}

/// 抓取器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 单个分类最多抓取的页数（0 表示不限制）
    pub max_pages_per_category: u32,
    /// 页间延迟下限（毫秒）
    pub page_delay_min_ms: u64,
    /// 页间延迟上限（毫秒）
    pub page_delay_max_ms: u64,
    /// 导航页加载超时（秒）
    pub navigation_timeout_secs: u64,
    /// 分类列表页加载超时（秒）
    pub category_timeout_secs: u64,
    /// 商品详情页加载超时（秒）
    pub product_timeout_secs: u64,
}

impl CrawlerSettings {
    /// 导航页加载超时
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// 分类列表页加载超时
    pub fn category_timeout(&self) -> Duration {
        Duration::from_secs(self.category_timeout_secs)
    }

    /// 商品详情页加载超时
    pub fn product_timeout(&self) -> Duration {
        Duration::from_secs(self.product_timeout_secs)
    }
}

/// 重试配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// 最大尝试次数（含首次执行）
    pub max_attempts: u32,
    /// 初始退避时间（毫秒）
    pub base_delay_ms: u64,
    /// 退避时间上限（毫秒）
    pub max_delay_ms: u64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
}

impl RetrySettings {
    /// 转换为重试策略
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.base_delay_ms),
            max_backoff: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: 2.0,
            jitter_factor: self.jitter_factor,
            enable_jitter: self.jitter_factor > 0.0,
        }
    }
}

/// 礼貌性控制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessSettings {
    /// 每分钟请求数上限
    pub requests_per_minute: u32,
    /// 取得令牌后附加的随机延迟下限（毫秒）
    pub request_delay_min_ms: u64,
    /// 取得令牌后附加的随机延迟上限（毫秒）
    pub request_delay_max_ms: u64,
}

/// 批量持久化配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceSettings {
    /// 批量写入失败策略 (log_and_continue, propagate)
    pub batch_failure_policy: String,
    /// 进度快照的过期时间（秒）
    pub progress_ttl_secs: u64,
}

/// Worker配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 并发Worker数量
    pub count: usize,
    /// 任务队列使用的键
    pub queue_key: String,
}

/// 选择器配置设置
///
/// 每个字段是一个按优先级排列的候选选择器列表，提取时取第一个
/// 命中的选择器。目标站点改版后通常只需调整这里。
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSettings {
    /// 商品卡片
    pub product_card: Vec<String>,
    /// 商品标题
    pub product_title: Vec<String>,
    /// 商品作者
    pub product_author: Vec<String>,
    /// 商品价格
    pub product_price: Vec<String>,
    /// 商品原价
    pub product_original_price: Vec<String>,
    /// 商品图片
    pub product_image: Vec<String>,
    /// 商品详情链接
    pub product_link: Vec<String>,
    /// 商品品相
    pub product_condition: Vec<String>,
    /// 导航菜单项
    pub nav_menu_item: Vec<String>,
    /// 导航菜单项链接
    pub nav_item_link: Vec<String>,
    /// 导航子分类链接
    pub nav_child_link: Vec<String>,
    /// 详情页描述
    pub detail_description: Vec<String>,
    /// 详情页规格行
    pub detail_specs: Vec<String>,
    /// 详情页图片
    pub detail_image: Vec<String>,
    /// 详情页评论
    pub detail_review: Vec<String>,
    /// 详情页相关商品标题
    pub detail_related: Vec<String>,
    /// 分页控件
    pub pagination_controls: Vec<String>,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            product_card: list(&[".product-card", ".book-item", "li.product", ".search-result"]),
            product_title: list(&[".product-title", ".book-title", "h2 a"]),
            product_author: list(&[".product-author", ".book-author", ".author"]),
            product_price: list(&[".price .amount", ".product-price", ".price"]),
            product_original_price: list(&[".price .was", ".original-price", ".price-strike"]),
            product_image: list(&[".product-image img", ".book-cover img", "img.cover"]),
            product_link: list(&[".product-title a", "h2 a", "a.product-link"]),
            product_condition: list(&[".condition", ".product-condition"]),
            nav_menu_item: list(&["nav.main-nav > ul > li", ".navigation .nav-item", "#main-menu > li"]),
            nav_item_link: list(&["a.nav-link", "a"]),
            nav_child_link: list(&[".submenu a", ".dropdown a", "ul a"]),
            detail_description: list(&["#product-description", ".product-description", ".description"]),
            detail_specs: list(&[".product-specs li", ".specifications tr", ".product-details li"]),
            detail_image: list(&[".product-gallery img", ".product-image img", "img.main-image"]),
            detail_review: list(&[".review-content", ".review-text", ".customer-review p"]),
            detail_related: list(&[".related-products .product-title", ".recommendations .title"]),
            pagination_controls: list(&[".pagination a", ".pagination li", ".pager a"]),
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let selectors = SelectorSettings::default();

        let builder = Config::builder()
            // Default DB / Redis settings (local development)
            .set_default("database.url", "sqlite://bookrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            // Default target site settings
            .set_default("site.base_url", "https://www.pageturner-books.example")?
            .set_default("site.user_agent", "bookrs-bot/1.0")?
            // Default crawler settings
            .set_default("crawler.max_pages_per_category", 0)?
            .set_default("crawler.page_delay_min_ms", 1000)?
            .set_default("crawler.page_delay_max_ms", 3000)?
            .set_default("crawler.navigation_timeout_secs", 15)?
            .set_default("crawler.category_timeout_secs", 30)?
            .set_default("crawler.product_timeout_secs", 30)?
            // Default retry settings
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_delay_ms", 30000)?
            .set_default("retry.jitter_factor", 0.1)?
            // Default politeness settings
            .set_default("politeness.requests_per_minute", 20)?
            .set_default("politeness.request_delay_min_ms", 250)?
            .set_default("politeness.request_delay_max_ms", 750)?
            // Default persistence settings
            .set_default("persistence.batch_failure_policy", "log_and_continue")?
            .set_default("persistence.progress_ttl_secs", 120)?
            // Default worker settings
            .set_default("workers.count", 2)?
            .set_default("workers.queue_key", "scrape:tasks")?
            // Default selector lists
            .set_default("selectors.product_card", selectors.product_card)?
            .set_default("selectors.product_title", selectors.product_title)?
            .set_default("selectors.product_author", selectors.product_author)?
            .set_default("selectors.product_price", selectors.product_price)?
            .set_default(
                "selectors.product_original_price",
                selectors.product_original_price,
            )?
            .set_default("selectors.product_image", selectors.product_image)?
            .set_default("selectors.product_link", selectors.product_link)?
            .set_default("selectors.product_condition", selectors.product_condition)?
            .set_default("selectors.nav_menu_item", selectors.nav_menu_item)?
            .set_default("selectors.nav_item_link", selectors.nav_item_link)?
            .set_default("selectors.nav_child_link", selectors.nav_child_link)?
            .set_default("selectors.detail_description", selectors.detail_description)?
            .set_default("selectors.detail_specs", selectors.detail_specs)?
            .set_default("selectors.detail_image", selectors.detail_image)?
            .set_default("selectors.detail_review", selectors.detail_review)?
            .set_default("selectors.detail_related", selectors.detail_related)?
            .set_default(
                "selectors.pagination_controls",
                selectors.pagination_controls,
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("BOOKRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
