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

use crate::config::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// 连接的最长生命周期，超过后由连接池回收重建
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(3600);

/// 创建数据库连接池
///
/// 池参数全部来自配置，未配置的项沿用 sea-orm 默认值。
/// 同时支持 Postgres 与本地开发用的 SQLite。
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&settings.url);
    options
        .max_lifetime(MAX_CONNECTION_LIFETIME)
        .sqlx_logging(true);

    if let Some(max) = settings.max_connections {
        options.max_connections(max);
    }
    if let Some(min) = settings.min_connections {
        options.min_connections(min);
    }
    if let Some(secs) = settings.connect_timeout {
        let timeout = Duration::from_secs(secs);
        options.connect_timeout(timeout).acquire_timeout(timeout);
    }
    if let Some(secs) = settings.idle_timeout {
        options.idle_timeout(Duration::from_secs(secs));
    }

    Database::connect(options).await
}
