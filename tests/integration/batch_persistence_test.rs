// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 批量持久化协调器集成测试
//!
//! 用内存仓库验证upsert幂等性、进度快照生命周期
//! 与可配置的失败策略。

use std::sync::Arc;

use super::helpers::{product, MemoryProductRepository, MemoryProgressStore};
use bookrs::domain::models::catalog::PageProgress;
use bookrs::domain::services::batch_persistence::{BatchFailurePolicy, BatchPersister};

fn persister(
    repo: Arc<MemoryProductRepository>,
    progress: Arc<MemoryProgressStore>,
    policy: BatchFailurePolicy,
) -> BatchPersister<MemoryProductRepository> {
    BatchPersister::new(repo, progress, policy)
}

#[tokio::test]
async fn test_replaying_a_batch_leaves_count_unchanged() {
    let repo = Arc::new(MemoryProductRepository::new());
    let progress = Arc::new(MemoryProgressStore::new());
    let persister = persister(repo.clone(), progress, BatchFailurePolicy::LogAndContinue);

    let batch = vec![product("dune-1", "Dune"), product("hobbit-2", "The Hobbit")];
    let page = PageProgress { current: 1, total: 4 };

    persister.persist_batch(7, "fiction", &batch, page).await.unwrap();
    persister.persist_batch(7, "fiction", &batch, page).await.unwrap();

    // source_id 为自然键，重放不会产生重复记录
    assert_eq!(repo.stored().len(), 2);
    let snapshot = persister.read_progress(7, "fiction").await.unwrap();
    assert_eq!(snapshot.products_count, 2);
}

#[tokio::test]
async fn test_progress_snapshot_lifecycle() {
    let repo = Arc::new(MemoryProductRepository::new());
    let progress = Arc::new(MemoryProgressStore::new());
    let persister = persister(repo, progress, BatchFailurePolicy::LogAndContinue);

    let batch = vec![product("dune-1", "Dune")];
    persister
        .persist_batch(7, "fiction", &batch, PageProgress { current: 2, total: 5 })
        .await
        .unwrap();

    let active = persister.read_progress(7, "fiction").await.unwrap();
    assert!(active.active);
    assert_eq!(active.current_page, Some(2));
    assert_eq!(active.total_pages, Some(5));

    // 作业结束后快照被清理，计数仍来自持久化存储
    persister.finish("fiction").await;
    let done = persister.read_progress(7, "fiction").await.unwrap();
    assert!(!done.active);
    assert_eq!(done.current_page, None);
    assert_eq!(done.products_count, 1);
}

#[tokio::test]
async fn test_empty_batch_is_skipped() {
    let repo = Arc::new(MemoryProductRepository::new());
    let progress = Arc::new(MemoryProgressStore::new());
    let persister = persister(repo, progress, BatchFailurePolicy::LogAndContinue);

    persister
        .persist_batch(7, "fiction", &[], PageProgress { current: 1, total: 1 })
        .await
        .unwrap();

    let snapshot = persister.read_progress(7, "fiction").await.unwrap();
    assert!(!snapshot.active);
    assert_eq!(snapshot.products_count, 0);
}

#[tokio::test]
async fn test_log_and_continue_swallows_write_failure() {
    let repo = Arc::new(MemoryProductRepository::new());
    let progress = Arc::new(MemoryProgressStore::new());
    let persister = persister(repo.clone(), progress, BatchFailurePolicy::LogAndContinue);

    repo.set_fail_writes(true);
    let batch = vec![product("dune-1", "Dune")];
    let outcome = persister
        .persist_batch(7, "fiction", &batch, PageProgress { current: 1, total: 1 })
        .await;

    // 默认策略吞掉存储失败，抓取得以继续
    assert!(outcome.is_ok());
    // 失败的批次不发布进度快照
    let snapshot = persister.read_progress(7, "fiction").await.unwrap();
    assert!(!snapshot.active);
}

#[tokio::test]
async fn test_propagate_policy_surfaces_write_failure() {
    let repo = Arc::new(MemoryProductRepository::new());
    let progress = Arc::new(MemoryProgressStore::new());
    let persister = persister(repo.clone(), progress, BatchFailurePolicy::Propagate);

    repo.set_fail_writes(true);
    let batch = vec![product("dune-1", "Dune")];
    let outcome = persister
        .persist_batch(7, "fiction", &batch, PageProgress { current: 1, total: 1 })
        .await;

    assert!(outcome.is_err());
}
