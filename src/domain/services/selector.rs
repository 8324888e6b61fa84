// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{ElementRef, Html, Selector};

/// 在文档范围内查找第一个有命中的候选选择器的全部匹配
///
/// 按顺序尝试候选选择器，返回第一个非空匹配集。语法非法的
/// 选择器被跳过而不是报错，只要列表中还有一个选择器命中，
/// 提取就能继续，以此容忍站点局部改版。
pub fn select_all_in_doc<'a>(doc: &'a Html, candidates: &[String]) -> Vec<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let matches: Vec<ElementRef<'a>> = doc.select(&selector).collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

/// 在文档范围内查找第一个有命中的候选选择器的首个匹配
pub fn select_first_in_doc<'a>(doc: &'a Html, candidates: &[String]) -> Option<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = doc.select(&selector).next() {
            return Some(element);
        }
    }
    None
}

/// 在元素范围内查找第一个有命中的候选选择器的全部匹配
pub fn select_all_in<'a>(scope: ElementRef<'a>, candidates: &[String]) -> Vec<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let matches: Vec<ElementRef<'a>> = scope.select(&selector).collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}

/// 在元素范围内查找第一个有命中的候选选择器的首个匹配
pub fn select_first_in<'a>(scope: ElementRef<'a>, candidates: &[String]) -> Option<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(element) = scope.select(&selector).next() {
            return Some(element);
        }
    }
    None
}

/// 提取元素的纯文本内容
pub fn text_of(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
