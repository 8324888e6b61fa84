// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regex::Regex;
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::domain::services::selector::{select_all_in_doc, text_of};

/// 站点每页固定展示的商品数
const PAGE_SIZE: u32 = 40;

/// 估算分类的总页数
///
/// 三级回退启发式，按顺序尝试，第一个命中的结果生效：
/// 1. 页面正文中的 "N products" / "out of N" 数字模式，按每页
///    商品数向上取整；
/// 2. 页内链接中 `page=` 查询参数的最大数值；
/// 3. 分页控件文本中的最大数字标签。
/// 全部落空时返回1。只应在首页加载后、进入抓取循环之前调用。
pub fn estimate_total_pages(html: &str, pagination_selectors: &[String]) -> u32 {
    let doc = Html::parse_document(html);

    if let Some(total) = from_result_count(&doc) {
        debug!("Page count from result-count text: {}", total);
        return total;
    }

    if let Some(total) = from_page_links(&doc) {
        debug!("Page count from page= links: {}", total);
        return total;
    }

    if let Some(total) = from_pagination_labels(&doc, pagination_selectors) {
        debug!("Page count from pagination labels: {}", total);
        return total;
    }

    1
}

/// 启发式1：正文中的结果总数
fn from_result_count(doc: &Html) -> Option<u32> {
    let body = doc.root_element().text().collect::<Vec<_>>().join(" ");

    let count = Regex::new(r"(?i)([\d,]+)\s+products")
        .ok()
        .and_then(|re| capture_number(&re, &body))
        .or_else(|| {
            Regex::new(r"(?i)out\s+of\s+([\d,]+)")
                .ok()
                .and_then(|re| capture_number(&re, &body))
        })?;

    if count == 0 {
        return None;
    }
    Some(count.div_ceil(PAGE_SIZE))
}

/// 启发式2：带 `page=` 查询参数的链接
fn from_page_links(doc: &Html) -> Option<u32> {
    let Ok(selector) = scraper::Selector::parse("a[href]") else {
        return None;
    };

    doc.select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(page_param)
        .max()
}

/// 从href中解析 `page` 查询参数的数值
fn page_param(href: &str) -> Option<u32> {
    // 相对链接也要能解析，挂到一个占位基址上
    let url = Url::parse(href)
        .or_else(|_| Url::parse("http://placeholder.invalid").and_then(|base| base.join(href)))
        .ok()?;

    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

/// 启发式3：分页控件的数字标签
fn from_pagination_labels(doc: &Html, selectors: &[String]) -> Option<u32> {
    select_all_in_doc(doc, selectors)
        .into_iter()
        .filter_map(|el| text_of(el).parse().ok())
        .max()
}

/// 取正则首个捕获组的数值，允许千位分隔逗号
fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?
        .get(1)?
        .as_str()
        .replace(',', "")
        .parse()
        .ok()
}
