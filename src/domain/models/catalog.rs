// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 抓取到的分类
///
/// 导航抓取产出的瞬态值对象，核心逻辑在单次抓取调用之外
/// 不保留它，持久化由调用方决定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedCategory {
    /// 分类标题
    pub title: String,
    /// 分类别名（URL路径推导）
    pub slug: String,
    /// 分类URL
    pub url: String,
    /// 子分类
    pub children: Vec<ScrapedCategory>,
}

/// 抓取到的商品摘要
///
/// 分类列表页上一张商品卡片的内容。下游按 `source_id`
/// 作为自然键做 upsert。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProduct {
    /// 来源站点上的商品标识（URL末段推导）
    pub source_id: String,
    /// 商品标题
    pub title: String,
    /// 作者
    pub author: Option<String>,
    /// 价格
    pub price: f64,
    /// 原价
    pub original_price: Option<f64>,
    /// 封面图片URL
    pub image_url: Option<String>,
    /// 来源页面URL
    pub source_url: String,
    /// ISBN
    pub isbn: Option<String>,
    /// 品相
    pub condition: Option<String>,
    /// 出版社
    pub publisher: Option<String>,
    /// 是否有货
    pub available: bool,
}

impl ScrapedProduct {
    /// 判断记录是否有效
    ///
    /// 标题与来源标识均非空才视为有效记录，
    /// 无效记录在提取阶段被直接丢弃。
    pub fn is_valid(&self) -> bool {
        !self.source_id.is_empty() && !self.title.is_empty()
    }
}

/// 抓取到的商品详情
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedProductDetail {
    /// 商品描述
    pub description: Option<String>,
    /// 规格键值对
    pub specs: HashMap<String, String>,
    /// 详情图片URL
    pub image_url: Option<String>,
    /// 评论摘录
    pub reviews: Vec<String>,
    /// 相关商品标题
    pub related_titles: Vec<String>,
}

/// 抓取结果
///
/// 包裹一次抓取的载荷以及页数、条目数和逐页错误列表。
/// 部分失败体现在 `errors` 中，而不是整体报错。
#[derive(Debug, Clone)]
pub struct ScrapeResult<T> {
    /// 抓取产出的数据
    pub data: T,
    /// 实际完成的页数
    pub pages_scraped: u32,
    /// 条目总数
    pub total_items: u32,
    /// 逐页错误信息
    pub errors: Vec<String>,
}

impl<T: Default> Default for ScrapeResult<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            pages_scraped: 0,
            total_items: 0,
            errors: Vec::new(),
        }
    }
}

/// 单页进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProgress {
    /// 当前页码
    pub current: u32,
    /// 总页数
    pub total: u32,
}

/// 分类抓取进度（供轮询方读取）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlProgress {
    /// 是否存在未过期的进度快照
    pub active: bool,
    /// 已持久化的商品数
    pub products_count: u64,
    /// 当前页码
    pub current_page: Option<u32>,
    /// 总页数
    pub total_pages: Option<u32>,
}

/// 条目计数
///
/// 作业记录的 items_found 取集合长度，单值结果计为1。
pub trait ItemCount {
    /// 返回结果包含的条目数
    fn item_count(&self) -> i32;
}

impl<T> ItemCount for Vec<T> {
    fn item_count(&self) -> i32 {
        self.len() as i32
    }
}

impl ItemCount for ScrapedProductDetail {
    fn item_count(&self) -> i32 {
        1
    }
}

impl<T: ItemCount> ItemCount for ScrapeResult<T> {
    fn item_count(&self) -> i32 {
        self.data.item_count()
    }
}
