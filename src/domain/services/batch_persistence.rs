// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::models::catalog::{CrawlProgress, PageProgress, ScrapedProduct};
use crate::domain::repositories::product_repository::ProductRepository;

/// 进度快照存储
///
/// 供轮询方读取的短生命周期 `{current, total}` 快照。写入带
/// 过期时间，作业崩溃未清理时自动失效；读到的 `None` 同时
/// 覆盖"从未写入"与"已过期"两种情况。
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// 写入进度快照
    async fn write(&self, slug: &str, progress: PageProgress) -> Result<()>;

    /// 读取未过期的进度快照
    async fn read(&self, slug: &str) -> Result<Option<PageProgress>>;

    /// 删除进度快照
    async fn clear(&self, slug: &str) -> Result<()>;
}

/// 批量写入失败策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchFailurePolicy {
    /// 记录日志后继续抓取，分类计数可能暂时滞后
    #[default]
    LogAndContinue,
    /// 把失败传播给批次回调
    Propagate,
}

impl BatchFailurePolicy {
    /// 从配置字符串解析策略，无法识别时退回默认值
    pub fn from_config(value: &str) -> Self {
        match value {
            "log_and_continue" => BatchFailurePolicy::LogAndContinue,
            "propagate" => BatchFailurePolicy::Propagate,
            other => {
                warn!(
                    "Unknown batch failure policy '{}', using log_and_continue",
                    other
                );
                BatchFailurePolicy::LogAndContinue
            }
        }
    }
}

/// 批量持久化协调器
///
/// 消费分类抓取产出的增量批次：在单个事务内按 `source_id`
/// upsert 商品并刷新分类的权威计数，事务提交后把进度快照写入
/// 缓存。缓存写入是尽力而为的，从不参与事务。
pub struct BatchPersister<P: ProductRepository> {
    /// 商品仓库
    products: Arc<P>,
    /// 进度快照存储
    progress: Arc<dyn ProgressStore>,
    /// 批量写入失败策略
    policy: BatchFailurePolicy,
}

impl<P: ProductRepository> BatchPersister<P> {
    /// 创建新的批量持久化协调器实例
    ///
    /// # 参数
    ///
    /// * `products` - 商品仓库
    /// * `progress` - 进度快照存储
    /// * `policy` - 批量写入失败策略
    pub fn new(
        products: Arc<P>,
        progress: Arc<dyn ProgressStore>,
        policy: BatchFailurePolicy,
    ) -> Self {
        Self {
            products,
            progress,
            policy,
        }
    }

    /// 持久化一页商品并发布进度快照
    ///
    /// 空批次直接跳过。存储失败按配置的策略处理：默认记录日志
    /// 并返回成功以保住抓取进度，`propagate` 时把错误交回调用方。
    ///
    /// # 参数
    ///
    /// * `category_id` - 所属分类ID
    /// * `slug` - 分类别名，进度快照以此为键
    /// * `products` - 一页商品记录
    /// * `progress` - 本页完成后的进度
    pub async fn persist_batch(
        &self,
        category_id: i32,
        slug: &str,
        products: &[ScrapedProduct],
        progress: PageProgress,
    ) -> Result<()> {
        if products.is_empty() {
            return Ok(());
        }

        match self.products.upsert_batch(category_id, products).await {
            Ok(written) => {
                debug!(
                    "Persisted batch of {} products for category {} (page {}/{})",
                    written, category_id, progress.current, progress.total
                );
            }
            Err(e) => match self.policy {
                BatchFailurePolicy::LogAndContinue => {
                    error!(
                        "Batch persistence failed for category {}, continuing: {}",
                        category_id, e
                    );
                    return Ok(());
                }
                BatchFailurePolicy::Propagate => return Err(e.into()),
            },
        }

        if let Err(e) = self.progress.write(slug, progress).await {
            warn!("Progress snapshot write failed for {}: {}", slug, e);
        }

        Ok(())
    }

    /// 作业结束时清理进度快照
    ///
    /// 成功与失败的作业都要调用；清理失败无碍，快照会自行过期。
    pub async fn finish(&self, slug: &str) {
        if let Err(e) = self.progress.clear(slug).await {
            warn!("Progress snapshot cleanup failed for {}: {}", slug, e);
        }
    }

    /// 读取分类的抓取进度
    ///
    /// `active` 当且仅当存在未过期的进度快照；商品计数始终来自
    /// 持久化存储的权威查询。
    pub async fn read_progress(&self, category_id: i32, slug: &str) -> Result<CrawlProgress> {
        let products_count = self.products.count_by_category(category_id).await?;

        let snapshot = match self.progress.read(slug).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Progress snapshot read failed for {}: {}", slug, e);
                None
            }
        };

        Ok(CrawlProgress {
            active: snapshot.is_some(),
            products_count,
            current_page: snapshot.map(|s| s.current),
            total_pages: snapshot.map(|s| s.total),
        })
    }
}
