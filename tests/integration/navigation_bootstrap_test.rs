// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 导航引导用例集成测试
//!
//! 验证触发调用立即返回、后台任务写入分类树，
//! 成败均可通过错误通道与持久化计数观察。

use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{scripted_crawler, MemoryCategoryRepository, MemoryJobRepository, ScriptedEngine};
use bookrs::application::use_cases::bootstrap_navigation::NavigationBootstrap;
use bookrs::domain::models::scrape_job::{ScrapeJobStatus, ScrapeTargetType};
use bookrs::domain::services::job_tracker::JobTracker;

const NAV_HTML: &str = r#"
    <html><body>
        <nav class="main-nav"><ul>
            <li>
                <a class="nav-link" href="/c/fiction">Fiction</a>
                <div class="submenu"><a href="/c/fiction/fantasy">Fantasy</a></div>
            </li>
            <li><a class="nav-link" href="/c/nonfiction">Non-fiction</a></li>
        </ul></nav>
    </body></html>
"#;

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
async fn test_bootstrap_persists_category_tree() {
    let server = start_site().await;
    let nav_url = format!("{}/", server.uri());

    let engine = Arc::new(ScriptedEngine::new());
    engine.script(&nav_url, NAV_HTML);

    let crawler = Arc::new(scripted_crawler(engine, &server.uri()));
    let categories = Arc::new(MemoryCategoryRepository::new());
    let jobs = Arc::new(MemoryJobRepository::new());
    let tracker = Arc::new(JobTracker::new(jobs.clone()));

    let bootstrap = NavigationBootstrap::new(crawler, categories.clone(), tracker);
    let written = bootstrap.trigger(nav_url).await.unwrap().unwrap();

    // 顶级分类与子分类都落库
    assert_eq!(written, 3);
    assert_eq!(categories.slugs(), vec!["fantasy", "fiction", "nonfiction"]);
    assert_eq!(bootstrap.persisted_count().await.unwrap(), 3);

    // 引导作为一条导航作业记录，条目数为顶级分类数
    let job = jobs.single_job();
    assert_eq!(job.status, ScrapeJobStatus::Completed);
    assert_eq!(job.target_type, ScrapeTargetType::Navigation);
    assert_eq!(job.items_found, 2);
}

#[tokio::test]
async fn test_bootstrap_failure_is_observable_on_the_channel() {
    let server = start_site().await;
    let nav_url = format!("{}/", server.uri());

    // 未注入任何页面，抓取在重试耗尽后失败
    let engine = Arc::new(ScriptedEngine::new());
    let crawler = Arc::new(scripted_crawler(engine, &server.uri()));
    let categories = Arc::new(MemoryCategoryRepository::new());
    let jobs = Arc::new(MemoryJobRepository::new());
    let tracker = Arc::new(JobTracker::new(jobs.clone()));

    let bootstrap = NavigationBootstrap::new(crawler, categories.clone(), tracker);
    let outcome = bootstrap.trigger(nav_url).await.unwrap();

    assert!(outcome.is_err());
    assert_eq!(categories.slugs().len(), 0);

    let job = jobs.single_job();
    assert_eq!(job.status, ScrapeJobStatus::Failed);
    assert!(job.error_log.unwrap().contains("navigation scrape failed"));
}
