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

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeJobs::TargetUrl).string().not_null())
                    .col(ColumnDef::new(ScrapeJobs::TargetType).string().not_null())
                    .col(ColumnDef::new(ScrapeJobs::Status).string().not_null())
                    .col(
                        ColumnDef::new(ScrapeJobs::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScrapeJobs::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapeJobs::DurationMs).big_integer())
                    .col(
                        ColumnDef::new(ScrapeJobs::ItemsFound)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScrapeJobs::ErrorLog).text())
                    .col(
                        ColumnDef::new(ScrapeJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeJobs {
    Table,
    Id,
    TargetUrl,
    TargetType,
    Status,
    StartedAt,
    FinishedAt,
    DurationMs,
    ItemsFound,
    ErrorLog,
    CreatedAt,
}
