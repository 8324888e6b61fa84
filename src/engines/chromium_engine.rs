// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserEngine, EngineError, PageRequest};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::OnceCell;

/// 等待选择器时的轮询间隔
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 目录抓取不需要的重资源，按URL模式在网络层拦截
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.woff", "*.woff2",
    "*.ttf", "*.otf", "*.mp4", "*.webm", "*.mp3",
];

// Global browser instance to avoid re-launching Chrome on every request.
// This significantly improves performance for browser-based scraping.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

// Asynchronously gets or initializes the shared browser instance.
// This function ensures that the browser is launched only once.
async fn get_browser() -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let remote_debugging_url = std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok();

            let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
                tracing::info!("Connecting to remote Chrome instance at: {}", url);
                Browser::connect(url).await.map_err(|e| {
                    EngineError::BrowserUnavailable(format!(
                        "Failed to connect to remote Chrome: {}",
                        e
                    ))
                })?
            } else {
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(Duration::from_secs(30));

                builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

                Browser::launch(
                    builder
                        .build()
                        .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?,
                )
                .await
                .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?
            };

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// Chromium引擎
///
/// 基于chromiumoxide的浏览器自动化引擎，整个进程复用同一个
/// 浏览器实例，每次抓取在新标签页中完成并在返回前关闭标签页。
pub struct ChromiumEngine {
    /// 出站请求使用的 User-Agent
    user_agent: String,
}

impl ChromiumEngine {
    /// 创建新的Chromium引擎实例
    ///
    /// # 参数
    ///
    /// * `user_agent` - 出站请求使用的 User-Agent
    pub fn new(user_agent: String) -> Self {
        Self { user_agent }
    }

    /// 在页面上等待选择器出现
    ///
    /// 以固定间隔轮询，直到元素出现。外层的整体超时负责
    /// 限制总等待时间。
    async fn wait_for_selector(page: &Page, selector: &str) -> Result<(), EngineError> {
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn load_on(&self, page: &Page, request: &PageRequest) -> Result<String, EngineError> {
        page.set_user_agent(self.user_agent.as_str())
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        let blocked = BLOCKED_URL_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>();
        page.execute(SetBlockedUrLsParams::new(blocked))
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        // goto waits for the load event by default
        page.goto(request.url.as_str())
            .await
            .map_err(|e| EngineError::NavigationFailed(e.to_string()))?;

        if let Some(selector) = &request.wait_selector {
            Self::wait_for_selector(page, selector).await?;
        }

        page.content()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    /// 加载页面并返回渲染后的HTML
    ///
    /// 整次加载（导航、等待选择器、取HTML快照）都受请求超时
    /// 约束，超时返回 `EngineError::Timeout`。
    async fn fetch_page(&self, request: &PageRequest) -> Result<String, EngineError> {
        let browser = get_browser().await?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?;

        let result = tokio::time::timeout(request.timeout, self.load_on(&page, request))
            .await
            .unwrap_or(Err(EngineError::Timeout));

        // 标签页不复用，超时与失败路径同样需要回收
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page: {}", e);
        }

        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
