// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{ElementRef, Html};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::config::settings::SelectorSettings;
use crate::domain::models::catalog::{ScrapedCategory, ScrapedProduct, ScrapedProductDetail};
use crate::domain::services::selector::{
    select_all_in, select_all_in_doc, select_first_in, select_first_in_doc, text_of,
};
use crate::utils::url_utils;

/// 规格键的最大长度，超出视为噪声行
const MAX_SPEC_KEY_LEN: usize = 50;

/// 详情页最多保留的评论摘录数
const MAX_REVIEWS: usize = 5;

/// 详情页最多保留的相关商品标题数
const MAX_RELATED: usize = 4;

/// 图片懒加载时常见的data属性，按优先级排列
const LAZY_IMAGE_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original"];

/// 页面提取器
///
/// 把加载后的页面HTML转换为类型化的目录记录。每个字段都通过
/// 候选选择器列表解析，只要列表中还有一个选择器命中，提取
/// 就能在站点局部改版后继续工作。
pub struct PageExtractor {
    /// 候选选择器配置
    selectors: SelectorSettings,
    /// 站点基础URL，相对链接据此解析
    base_url: Url,
}

impl PageExtractor {
    /// 创建新的页面提取器实例
    ///
    /// # 参数
    ///
    /// * `selectors` - 候选选择器配置
    /// * `base_url` - 站点基础URL
    pub fn new(selectors: SelectorSettings, base_url: Url) -> Self {
        Self {
            selectors,
            base_url,
        }
    }

    /// 候选选择器配置
    pub fn selectors(&self) -> &SelectorSettings {
        &self.selectors
    }

    /// 从分类列表页提取商品摘要
    ///
    /// 每张商品卡片独立解析，标题或来源链接缺失的卡片被静默
    /// 丢弃，不影响同页的其余卡片。
    pub fn extract_products(&self, html: &str) -> Vec<ScrapedProduct> {
        let doc = Html::parse_document(html);
        let cards = select_all_in_doc(&doc, &self.selectors.product_card);

        let mut products = Vec::with_capacity(cards.len());
        for card in cards {
            if let Some(product) = self.extract_card(card) {
                products.push(product);
            }
        }

        debug!("Extracted {} products from listing page", products.len());
        products
    }

    /// 解析单张商品卡片
    fn extract_card(&self, card: ElementRef) -> Option<ScrapedProduct> {
        let title = select_first_in(card, &self.selectors.product_title)
            .map(text_of)
            .unwrap_or_default();

        let href = select_first_in(card, &self.selectors.product_link)
            .and_then(|link| link.value().attr("href"))
            .unwrap_or_default();

        if title.is_empty() || href.is_empty() {
            return None;
        }

        let source_url = url_utils::resolve_url(&self.base_url, href).ok()?;
        let source_id = url_utils::last_path_segment(&source_url)?;

        let author = select_first_in(card, &self.selectors.product_author)
            .map(text_of)
            .filter(|s| !s.is_empty());

        let price = select_first_in(card, &self.selectors.product_price)
            .map(|e| parse_price(&text_of(e)))
            .unwrap_or(0.0);

        let original_price = select_first_in(card, &self.selectors.product_original_price)
            .map(|e| parse_price(&text_of(e)))
            .filter(|p| *p > 0.0);

        let image_url = select_first_in(card, &self.selectors.product_image)
            .and_then(|img| image_src(img))
            .and_then(|src| url_utils::resolve_url(&self.base_url, &src).ok())
            .map(|u| u.to_string());

        let condition = select_first_in(card, &self.selectors.product_condition)
            .map(text_of)
            .filter(|s| !s.is_empty());

        let product = ScrapedProduct {
            source_id,
            title,
            author,
            price,
            original_price,
            image_url,
            source_url: source_url.to_string(),
            isbn: None,
            condition,
            publisher: None,
            available: true,
        };

        product.is_valid().then_some(product)
    }

    /// 从商品详情页提取描述、规格、评论与相关商品
    ///
    /// 任一部分缺失都不影响其余部分的提取。
    pub fn extract_product_detail(&self, html: &str) -> ScrapedProductDetail {
        let doc = Html::parse_document(html);

        let description = select_first_in_doc(&doc, &self.selectors.detail_description)
            .map(text_of)
            .filter(|s| !s.is_empty());

        let mut specs = HashMap::new();
        for row in select_all_in_doc(&doc, &self.selectors.detail_specs) {
            let text = text_of(row);
            let Some((key, value)) = text.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() || key.len() > MAX_SPEC_KEY_LEN {
                continue;
            }
            specs.insert(key.to_string(), value.to_string());
        }

        let image_url = select_first_in_doc(&doc, &self.selectors.detail_image)
            .and_then(|img| image_src(img))
            .and_then(|src| url_utils::resolve_url(&self.base_url, &src).ok())
            .map(|u| u.to_string());

        let reviews = select_all_in_doc(&doc, &self.selectors.detail_review)
            .into_iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .take(MAX_REVIEWS)
            .collect();

        let related_titles = select_all_in_doc(&doc, &self.selectors.detail_related)
            .into_iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .take(MAX_RELATED)
            .collect();

        ScrapedProductDetail {
            description,
            specs,
            image_url,
            reviews,
            related_titles,
        }
    }

    /// 从站点首页提取导航菜单
    ///
    /// 每个顶级菜单项产出一个分类，子链接作为其子分类。
    /// 标题或链接缺失的菜单项被跳过。
    pub fn extract_navigation(&self, html: &str) -> Vec<ScrapedCategory> {
        let doc = Html::parse_document(html);
        let items = select_all_in_doc(&doc, &self.selectors.nav_menu_item);

        let mut categories = Vec::with_capacity(items.len());
        for item in items {
            let Some(link) = select_first_in(item, &self.selectors.nav_item_link) else {
                continue;
            };
            let Some(parent) = self.category_from_link(link) else {
                continue;
            };

            let children = select_all_in(item, &self.selectors.nav_child_link)
                .into_iter()
                .filter(|child| child.id() != link.id())
                .filter_map(|child| self.category_from_link(child))
                .collect();

            categories.push(ScrapedCategory {
                children,
                ..parent
            });
        }

        debug!("Extracted {} navigation categories", categories.len());
        categories
    }

    /// 把一个链接元素转换为分类
    fn category_from_link(&self, link: ElementRef) -> Option<ScrapedCategory> {
        let title = text_of(link);
        let href = link.value().attr("href")?;
        if title.is_empty() || href.is_empty() {
            return None;
        }

        let url = url_utils::resolve_url(&self.base_url, href).ok()?;
        let slug = url_utils::last_path_segment(&url)?;

        Some(ScrapedCategory {
            title,
            slug,
            url: url.to_string(),
            children: Vec::new(),
        })
    }
}

/// 解析价格文本
///
/// 去掉数字和小数点以外的全部字符后按浮点数解析，
/// 解析失败时返回0.0。
pub fn parse_price(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// 取图片元素的地址，优先 `src`，其次常见的懒加载data属性
fn image_src(img: ElementRef) -> Option<String> {
    let value = img.value();
    if let Some(src) = value.attr("src").filter(|s| !s.is_empty()) {
        return Some(src.to_string());
    }
    LAZY_IMAGE_ATTRS
        .iter()
        .find_map(|attr| value.attr(attr))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
