// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 分类抓取编排器集成测试
//!
//! 用脚本化引擎驱动完整的多页抓取流程，验证页数上限、
//! 单页失败隔离与robots门控行为。

use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{listing_page, scripted_crawler, ScriptedEngine};
use bookrs::domain::models::catalog::PageProgress;

async fn start_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_max_pages_cap_stops_before_detected_total() {
    let server = start_site().await;
    let base = format!("{}/c/fiction", server.uri());

    // 首页宣称200个商品（5页），但本次调用上限为2页
    let engine = Arc::new(ScriptedEngine::new());
    engine.script(
        &base,
        &listing_page(
            Some("Showing 40 of 200 products"),
            &[("book-a-1", "Book A"), ("book-b-2", "Book B")],
        ),
    );
    engine.script(
        &format!("{}?page=2", base),
        &listing_page(None, &[("book-c-3", "Book C")]),
    );

    let crawler = scripted_crawler(engine.clone(), &server.uri());

    let calls: Arc<Mutex<Vec<(usize, PageProgress)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let result = crawler
        .scrape_category(&base, Some(2), move |products, progress| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push((products.len(), progress));
                Ok(())
            }
        })
        .await;

    assert_eq!(result.pages_scraped, 2);
    assert_eq!(result.total_items, 3);
    assert_eq!(result.data.len(), 3);
    assert!(result.errors.is_empty());

    // 回调恰好每页一次，页码严格递增
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, PageProgress { current: 1, total: 2 });
    assert_eq!(calls[1].1, PageProgress { current: 2, total: 2 });
    assert!(calls[0].1.current < calls[1].1.current);

    // 第3页从未被请求
    assert!(engine.requested().iter().all(|u| !u.contains("page=3")));
}

#[tokio::test]
async fn test_failing_page_does_not_abort_crawl() {
    let server = start_site().await;
    let base = format!("{}/c/scifi", server.uri());

    // 3页中第2页未注入脚本，重试耗尽后应跳过并继续
    let engine = Arc::new(ScriptedEngine::new());
    engine.script(
        &base,
        &listing_page(Some("120 products"), &[("dune-1", "Dune")]),
    );
    engine.script(
        &format!("{}?page=3", base),
        &listing_page(None, &[("hyperion-3", "Hyperion")]),
    );

    let crawler = scripted_crawler(engine.clone(), &server.uri());

    let result = crawler
        .scrape_category(&base, None, |_, _| async { Ok(()) })
        .await;

    assert_eq!(result.pages_scraped, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("page 2"));

    // 成功页的数据保留，失败页没有留下半成品
    let titles: Vec<&str> = result.data.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Hyperion"]);

    // 失败页按重试策略被尝试了两次
    let page2 = format!("{}?page=2", base);
    let attempts = engine.requested().iter().filter(|u| **u == page2).count();
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn test_batch_callback_failure_is_recorded_and_crawl_continues() {
    let server = start_site().await;
    let base = format!("{}/c/history", server.uri());

    let engine = Arc::new(ScriptedEngine::new());
    engine.script(
        &base,
        &listing_page(Some("80 products"), &[("rome-1", "SPQR")]),
    );
    engine.script(
        &format!("{}?page=2", base),
        &listing_page(None, &[("maps-2", "Maps of Time")]),
    );

    let crawler = scripted_crawler(engine, &server.uri());

    let result = crawler
        .scrape_category(&base, None, |_, progress| async move {
            if progress.current == 1 {
                Err(anyhow::anyhow!("store offline"))
            } else {
                Ok(())
            }
        })
        .await;

    assert_eq!(result.pages_scraped, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("batch callback failed"));
    // 回调失败不丢弃该页已提取的数据
    assert_eq!(result.data.len(), 2);
}

#[tokio::test]
async fn test_robots_disallow_skips_category_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .mount(&server)
        .await;

    let engine = Arc::new(ScriptedEngine::new());
    let crawler = scripted_crawler(engine.clone(), &server.uri());

    let base = format!("{}/c/fiction", server.uri());
    let result = crawler
        .scrape_category(&base, None, |_, _| async { Ok(()) })
        .await;

    // 政策性跳过不是错误，产出空结果
    assert_eq!(result.pages_scraped, 0);
    assert!(result.data.is_empty());
    assert!(result.errors.is_empty());
    assert!(engine.requested().is_empty());
}
