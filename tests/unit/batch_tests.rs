/*!
 * Tests for batch completion and task validity
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use poorly_translated::errors::TranslationError;
use poorly_translated::providers::mock::MockEndpoint;
use poorly_translated::storage::StringStorage;
use poorly_translated::translation::{BatchStatus, PoolLimits, Task, TranslationBatch, TranslationTask};

use crate::common;

/// Racing writers must remove every key exactly once and resolve the batch once
#[test]
fn test_set_result_withRacingThreads_shouldRemoveEachKeyOnce() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let storage = common::numbered_storage(200);
    let batch = TranslationBatch::from_storage(pool, storage.clone(), "fr", 5);
    let accepted = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|thread| {
            let batch = batch.clone();
            let accepted = accepted.clone();
            std::thread::spawn(move || {
                for key in 0..200usize {
                    if batch.set_result(&key, format!("thread {}", thread)) {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(accepted.load(Ordering::SeqCst), 200);
    assert_eq!(batch.remaining(), 0);
    assert_eq!(batch.status(), BatchStatus::Completed);
    assert!(storage.try_get(&0).unwrap().starts_with("thread "));
}

/// The remaining count only ever shrinks
#[test]
fn test_remaining_withResults_shouldStrictlyShrink() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let batch = TranslationBatch::from_storage(pool, common::numbered_storage(5), "fr", 5);

    let mut last = batch.remaining();
    for key in 0..5usize {
        batch.set_result(&key, "x".to_string());
        let now = batch.remaining();
        assert!(now < last);
        last = now;
    }
    assert_eq!(last, 0);
}

/// A batch over an explicit key subset only tracks those keys
#[test]
fn test_new_withKeySubset_shouldOnlyTrackSubset() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let batch = TranslationBatch::new(pool, common::numbered_storage(10), [1usize, 2, 3], "de", 5);

    assert_eq!(batch.remaining(), 3);
    assert!(!batch.set_result(&7, "ignored".to_string()));
    assert_eq!(batch.remaining(), 3);
}

/// Tasks report the batch's settings
#[test]
fn test_task_withBatch_shouldDelegateEverything() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let storage = common::numbered_storage(2);
    let batch = TranslationBatch::from_storage(pool, storage.clone(), "ja", 3);
    let task = Task::new(batch.clone(), 1usize);

    assert_eq!(task.language(), "ja");
    assert_eq!(task.hops(), 3);
    assert_eq!(task.text().as_deref(), Some("text number 1"));
    assert!(task.is_active());

    assert!(task.set_result("done".to_string()));
    assert!(!task.is_active());
    assert!(!task.set_result("again".to_string()));
    assert_eq!(storage.try_get(&1).as_deref(), Some("done"));
}

/// A fired cancellation token makes every task inactive
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_translate_withCancelledToken_shouldReturnCancelled() {
    let (endpoint, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let batch = TranslationBatch::from_storage(pool.clone(), common::numbered_storage(10), "fr", 5);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = batch.translate(cancel).await;

    assert!(matches!(result, Err(TranslationError::Cancelled)));
    assert_eq!(batch.status(), BatchStatus::Cancelled);
    assert_eq!(endpoint.request_count(), 0);
    pool.stop_all().await;
}

/// Cancelling while tasks are in flight resolves the caller without waiting for them
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_translate_withCancelDuringFlight_shouldResolveCancelled() {
    let (_, pool) = common::mock_pool(MockEndpoint::slow(200), PoolLimits::new(4, 5));
    let batch = TranslationBatch::from_storage(pool.clone(), common::numbered_storage(4), "fr", 5);
    let cancel = CancellationToken::new();

    let translating = {
        let batch = batch.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { batch.translate(cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), translating).await.unwrap().unwrap();
    assert!(matches!(result, Err(TranslationError::Cancelled)));
    assert_eq!(batch.wait().await, BatchStatus::Cancelled);

    pool.stop_all().await;
    assert_eq!(pool.live_workers(), 0);
}

/// Several waiters all see the single resolution
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_withManyWaiters_shouldAllSeeCompletion() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let batch = TranslationBatch::from_storage(pool, common::numbered_storage(3), "fr", 1);

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let batch = batch.clone();
            tokio::spawn(async move { batch.wait().await })
        })
        .collect();

    batch.translate(CancellationToken::new()).await.unwrap();

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), BatchStatus::Completed);
    }
}

/// Keys the storage does not hold are skipped and the batch still completes
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_translate_withKeyMissingFromStorage_shouldSkipItAndComplete() {
    let (endpoint, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let storage = common::numbered_storage(2);
    let batch = TranslationBatch::new(pool.clone(), storage.clone(), [0usize, 1, 7], "fr", 1);

    let result = tokio::time::timeout(Duration::from_secs(2), batch.translate(CancellationToken::new())).await;

    assert!(matches!(result, Ok(Ok(()))));
    assert_eq!(batch.status(), BatchStatus::Completed);
    assert_eq!(storage.try_get(&7), None);
    assert!(storage.try_get(&1).unwrap().starts_with("[fr] "));
    assert_eq!(endpoint.request_count(), 4);
}

/// Skipping removes the key without touching storage
#[test]
fn test_skip_withLastKey_shouldCompleteWithoutWriting() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let storage = common::numbered_storage(1);
    let batch = TranslationBatch::from_storage(pool, storage.clone(), "fr", 1);

    assert!(batch.skip(&0));
    assert!(!batch.skip(&0));

    assert_eq!(batch.status(), BatchStatus::Completed);
    assert_eq!(storage.try_get(&0).as_deref(), Some("text number 0"));
}
