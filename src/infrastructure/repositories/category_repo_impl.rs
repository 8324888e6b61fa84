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

use crate::domain::models::catalog::ScrapedCategory;
use crate::domain::repositories::category_repository::CategoryRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::category as category_entity;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use std::sync::Arc;

/// 分类仓库实现
pub struct CategoryRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl CategoryRepositoryImpl {
    /// 创建新的分类仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的分类仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// upsert单个分类并返回其ID
    ///
    /// 不同数据库的 upsert 返回语义不一致，ID 统一通过查询取回。
    async fn upsert_one(
        txn: &DatabaseTransaction,
        category: &ScrapedCategory,
        parent_id: Option<i32>,
    ) -> Result<i32, RepositoryError> {
        let model = category_entity::ActiveModel {
            slug: Set(category.slug.clone()),
            title: Set(category.title.clone()),
            url: Set(category.url.clone()),
            parent_id: Set(parent_id),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        category_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(category_entity::Column::Slug)
                    .update_columns([
                        category_entity::Column::Title,
                        category_entity::Column::Url,
                        category_entity::Column::ParentId,
                    ])
                    .to_owned(),
            )
            .exec(txn)
            .await?;

        let row = category_entity::Entity::find()
            .filter(category_entity::Column::Slug.eq(category.slug.as_str()))
            .one(txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.id)
    }
}

#[async_trait]
impl CategoryRepository for CategoryRepositoryImpl {
    /// 以slug为自然键批量upsert分类树
    async fn upsert_tree(&self, categories: &[ScrapedCategory]) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;
        let mut written = 0u64;

        for root in categories {
            let parent_id = Self::upsert_one(&txn, root, None).await?;
            written += 1;

            for child in &root.children {
                Self::upsert_one(&txn, child, Some(parent_id)).await?;
                written += 1;
            }
        }

        txn.commit().await?;
        Ok(written)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count = category_entity::Entity::find()
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}
