// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 商品详情抓取用例集成测试
//!
//! 验证单个详情页抓取被包裹为一条商品作业记录。

use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{scripted_crawler, MemoryJobRepository, ScriptedEngine};
use bookrs::application::use_cases::product_detail::ProductDetailScrape;
use bookrs::domain::models::scrape_job::{ScrapeJobStatus, ScrapeTargetType};
use bookrs::domain::services::job_tracker::JobTracker;

const DETAIL_HTML: &str = r#"
    <html><body>
        <div id="product-description">A desert planet. A noble house. A prophecy.</div>
        <ul class="product-specs">
            <li>Publisher: Chilton Books</li>
            <li>Pages: 412</li>
        </ul>
        <div class="review-content">Unmatched worldbuilding.</div>
    </body></html>
"#;

#[tokio::test]
async fn test_detail_scrape_is_tracked_as_product_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let detail_url = format!("{}/books/dune-5150", server.uri());
    let engine = Arc::new(ScriptedEngine::new());
    engine.script(&detail_url, DETAIL_HTML);

    let crawler = Arc::new(scripted_crawler(engine, &server.uri()));
    let jobs = Arc::new(MemoryJobRepository::new());
    let tracker = Arc::new(JobTracker::new(jobs.clone()));

    let detail = ProductDetailScrape::new(crawler, tracker)
        .run(&detail_url)
        .await
        .unwrap();

    assert!(detail.description.unwrap().contains("desert planet"));
    assert_eq!(detail.specs["Pages"], "412");
    assert_eq!(detail.reviews.len(), 1);

    // 详情抓取记为一条商品作业，单值结果条目数为1
    let job = jobs.single_job();
    assert_eq!(job.status, ScrapeJobStatus::Completed);
    assert_eq!(job.target_type, ScrapeTargetType::Product);
    assert_eq!(job.items_found, 1);
}
