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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),
    /// 等待选择器或整页加载超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::NavigationFailed(_) => true,
            EngineError::Timeout => true,
            EngineError::BrowserUnavailable(_) => true,
            EngineError::Other(_) => false,
        }
    }
}

/// 页面加载请求
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 目标URL
    pub url: String,
    /// 导航完成后需要等到出现的选择器
    pub wait_selector: Option<String>,
    /// 整次加载的超时时间
    pub timeout: Duration,
}

impl PageRequest {
    /// 构造一个仅等待导航完成的请求
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            wait_selector: None,
            timeout,
        }
    }

    /// 附加等待选择器
    pub fn wait_for(mut self, selector: impl Into<String>) -> Self {
        self.wait_selector = Some(selector.into());
        self
    }
}

/// 浏览器引擎特质
///
/// 对无头浏览器自动化能力的最小抽象：导航到URL、等待指定
/// 选择器出现、返回渲染后的HTML快照。核心逻辑只依赖此契约，
/// 不关心底层浏览器实现。
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// 加载页面并返回渲染后的HTML
    ///
    /// # 参数
    ///
    /// * `request` - 页面加载请求
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 页面HTML内容
    /// * `Err(EngineError)` - 加载过程中出现的错误
    async fn fetch_page(&self, request: &PageRequest) -> Result<String, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
