// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::catalog::ScrapedCategory;
use crate::domain::repositories::RepositoryError;
use async_trait::async_trait;

/// 分类仓库特质
///
/// 定义目录分类的数据访问接口
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// 以slug为自然键批量upsert导航抓取产出的分类树
    ///
    /// 子分类随父分类一并写入并建立父子关联。
    ///
    /// # 返回值
    ///
    /// 返回写入（含更新）的分类数量
    async fn upsert_tree(&self, categories: &[ScrapedCategory]) -> Result<u64, RepositoryError>;

    /// 已持久化的分类总数
    async fn count(&self) -> Result<u64, RepositoryError>;
}
