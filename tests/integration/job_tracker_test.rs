// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 作业追踪器集成测试
//!
//! 验证每次顶层抓取调用恰好产生一条作业记录，
//! 且恰好发生一次终态变更。

use std::sync::Arc;

use super::helpers::MemoryJobRepository;
use bookrs::domain::models::catalog::ScrapedProductDetail;
use bookrs::domain::models::scrape_job::{ScrapeJobStatus, ScrapeTargetType};
use bookrs::domain::services::job_tracker::JobTracker;

#[tokio::test]
async fn test_successful_scrape_completes_job_with_item_count() {
    let repo = Arc::new(MemoryJobRepository::new());
    let tracker = JobTracker::new(repo.clone());

    let result = tracker
        .track("https://books.example.com/c/fiction", ScrapeTargetType::Category, || async {
            Ok(vec!["a", "b", "c"])
        })
        .await
        .unwrap();

    assert_eq!(result.len(), 3);

    let job = repo.single_job();
    assert_eq!(job.status, ScrapeJobStatus::Completed);
    assert_eq!(job.items_found, 3);
    assert_eq!(job.target_type, ScrapeTargetType::Category);
    assert!(job.finished_at.is_some());
    assert!(job.duration_ms.unwrap() >= 0);
    assert!(job.error_log.is_none());
}

#[tokio::test]
async fn test_failed_scrape_records_error_and_reraises() {
    let repo = Arc::new(MemoryJobRepository::new());
    let tracker = JobTracker::new(repo.clone());

    let result: anyhow::Result<Vec<String>> = tracker
        .track("https://books.example.com/c/fiction", ScrapeTargetType::Category, || async {
            Err(anyhow::anyhow!("target site exploded"))
        })
        .await;

    // 原始错误重新抛给调用方，由队列层决定是否整任务重试
    assert!(result.unwrap_err().to_string().contains("target site exploded"));

    let job = repo.single_job();
    assert_eq!(job.status, ScrapeJobStatus::Failed);
    assert_eq!(job.items_found, 0);
    assert!(job.finished_at.is_some());
    assert!(job.error_log.unwrap().contains("target site exploded"));
}

#[tokio::test]
async fn test_single_detail_result_counts_as_one_item() {
    let repo = Arc::new(MemoryJobRepository::new());
    let tracker = JobTracker::new(repo.clone());

    tracker
        .track("https://books.example.com/books/dune-1", ScrapeTargetType::Product, || async {
            Ok(ScrapedProductDetail::default())
        })
        .await
        .unwrap();

    let job = repo.single_job();
    assert_eq!(job.status, ScrapeJobStatus::Completed);
    assert_eq!(job.items_found, 1);
    assert_eq!(job.target_type, ScrapeTargetType::Product);
}

#[tokio::test]
async fn test_each_invocation_creates_exactly_one_job() {
    let repo = Arc::new(MemoryJobRepository::new());
    let tracker = JobTracker::new(repo.clone());

    for _ in 0..3 {
        tracker
            .track("https://books.example.com/c/fiction", ScrapeTargetType::Category, || async {
                Ok(Vec::<String>::new())
            })
            .await
            .unwrap();
    }

    assert_eq!(repo.created_ids().len(), 3);
}
