// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::catalog::ScrapedProduct;
use crate::domain::repositories::RepositoryError;
use async_trait::async_trait;

/// 商品仓库特质
///
/// 定义商品记录的数据访问接口
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 批量upsert一页商品
    ///
    /// 在单个事务内完成：按 `source_id` upsert 每个商品（冲突时
    /// 更新价格、库存、规格等易变字段），随后依据事务内的权威
    /// COUNT 查询刷新所属分类的商品数与最近抓取时间。计数不使用
    /// 内存累加值，以容忍并发写入方。
    ///
    /// # 参数
    ///
    /// * `category_id` - 所属分类ID
    /// * `products` - 一页商品记录
    ///
    /// # 返回值
    ///
    /// 返回写入（含更新）的商品数量
    async fn upsert_batch(
        &self,
        category_id: i32,
        products: &[ScrapedProduct],
    ) -> Result<u64, RepositoryError>;

    /// 指定分类下已持久化的商品数
    async fn count_by_category(&self, category_id: i32) -> Result<u64, RepositoryError>;
}
