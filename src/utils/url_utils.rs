// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 返回设置了 `page` 查询参数的URL
///
/// 第1页返回原URL本身，不附加参数。
pub fn with_page_param(url: &Url, page: u32) -> Url {
    if page <= 1 {
        return url.clone();
    }

    let mut paged = url.clone();
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = paged.query_pairs_mut();
        pairs.clear();
        for (k, v) in &others {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("page", &page.to_string());
    }

    paged
}

/// 提取URL路径的最后一段（跳过空段）
pub fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(|s| s.to_string())
}
