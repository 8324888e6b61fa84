// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 抓取任务载荷
///
/// 队列消息的内容，由外部触发方入队、Worker出队消费。
/// 字段名沿用站点侧既有的 camelCase 线上格式。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeTask {
    /// 分类列表页URL
    pub url: String,
    /// 目标分类ID
    pub category_id: i32,
    /// 分类别名
    pub slug: String,
    /// 本次调用的页数上限，覆盖配置的默认值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}
