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

use crate::domain::models::catalog::ScrapedProduct;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::category as category_entity;
use crate::infrastructure::database::entities::product as product_entity;
use async_trait::async_trait;
use sea_orm::prelude::ChronoDateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use std::sync::Arc;

/// 商品仓库实现
pub struct ProductRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ProductRepositoryImpl {
    /// 创建新的商品仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的商品仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for ProductRepositoryImpl {
    /// 在单个事务内批量upsert一页商品并刷新分类计数
    ///
    /// 冲突键为 `source_id`，冲突时更新价格、库存等易变字段。
    /// 分类计数来自事务内的权威COUNT查询，以容忍并发写入方。
    async fn upsert_batch(
        &self,
        category_id: i32,
        products: &[ScrapedProduct],
    ) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;
        let now: ChronoDateTimeWithTimeZone = chrono::Utc::now().into();

        for product in products {
            let model = product_entity::ActiveModel {
                source_id: Set(product.source_id.clone()),
                category_id: Set(category_id),
                title: Set(product.title.clone()),
                author: Set(product.author.clone()),
                price: Set(product.price),
                original_price: Set(product.original_price),
                image_url: Set(product.image_url.clone()),
                source_url: Set(product.source_url.clone()),
                isbn: Set(product.isbn.clone()),
                condition: Set(product.condition.clone()),
                publisher: Set(product.publisher.clone()),
                available: Set(product.available),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            product_entity::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(product_entity::Column::SourceId)
                        .update_columns([
                            product_entity::Column::Title,
                            product_entity::Column::Author,
                            product_entity::Column::Price,
                            product_entity::Column::OriginalPrice,
                            product_entity::Column::ImageUrl,
                            product_entity::Column::Condition,
                            product_entity::Column::Available,
                            product_entity::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec(&txn)
                .await?;
        }

        let count = product_entity::Entity::find()
            .filter(product_entity::Column::CategoryId.eq(category_id))
            .count(&txn)
            .await?;

        category_entity::Entity::update_many()
            .col_expr(
                category_entity::Column::ProductCount,
                Expr::value(count as i32),
            )
            .col_expr(category_entity::Column::LastScrapedAt, Expr::value(now))
            .filter(category_entity::Column::Id.eq(category_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(products.len() as u64)
    }

    async fn count_by_category(&self, category_id: i32) -> Result<u64, RepositoryError> {
        let count = product_entity::Entity::find()
            .filter(product_entity::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}
