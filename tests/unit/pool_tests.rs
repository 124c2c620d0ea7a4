/*!
 * Tests for the shared worker pool
 */

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use poorly_translated::errors::TranslationError;
use poorly_translated::providers::mock::MockEndpoint;
use poorly_translated::storage::StringStorage;
use poorly_translated::translation::{BatchStatus, PoolLimits, TranslationBatch};

use crate::common;

/// Batches of different languages share the pool without mixing results
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_withHeterogeneousBatches_shouldCompleteEach() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::new(8, 5));
    let french = common::numbered_storage(30);
    let german = common::numbered_storage(30);
    let fr = TranslationBatch::from_storage(pool.clone(), french.clone(), "fr", 2);
    let de = TranslationBatch::from_storage(pool.clone(), german.clone(), "de", 2);

    let (a, b) = tokio::join!(fr.translate(CancellationToken::new()), de.translate(CancellationToken::new()));
    a.unwrap();
    b.unwrap();

    for key in 0..30usize {
        assert!(french.try_get(&key).unwrap().starts_with("[fr] "));
        assert!(german.try_get(&key).unwrap().starts_with("[de] "));
    }
    assert_eq!(pool.completed_tasks(), 60);
}

/// 100 tasks never run on more than 32 workers, and workers retire afterwards
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_with100Tasks_shouldCapWorkersAt32() {
    let (endpoint, pool) = common::mock_pool(MockEndpoint::slow(10), PoolLimits::default());
    let batch = TranslationBatch::from_storage(pool.clone(), common::numbered_storage(100), "fr", 1);

    let translating = {
        let batch = batch.clone();
        tokio::spawn(async move { batch.translate(CancellationToken::new()).await })
    };

    let mut peak = 0;
    while !translating.is_finished() {
        peak = peak.max(pool.live_workers());
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    translating.await.unwrap().unwrap();

    assert!(peak <= 32, "peak of {} workers", peak);
    assert!(endpoint.peak_in_flight() <= 32);

    tokio::time::timeout(Duration::from_secs(2), async {
        while pool.live_workers() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

/// A hop count of zero falls back to five hops
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_withZeroHops_shouldUseDefaultHops() {
    let (endpoint, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let batch = TranslationBatch::from_storage(pool, common::numbered_storage(1), "fr", 0);

    batch.translate(CancellationToken::new()).await.unwrap();

    assert_eq!(endpoint.request_count(), 6);
}

/// Hop failures use up attempts but later attempts can still succeed
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_withFailingHop_shouldRetryWholeChain() {
    let (endpoint, pool) = common::mock_pool(MockEndpoint::fail_on_call(2), PoolLimits::new(1, 5));
    let storage = common::numbered_storage(1);
    let batch = TranslationBatch::from_storage(pool, storage.clone(), "fr", 2);

    batch.translate(CancellationToken::new()).await.unwrap();

    // call 2 fails the first attempt, calls 3-5 make the second one
    assert_eq!(endpoint.request_count(), 5);
    assert!(storage.try_get(&0).unwrap().starts_with("[fr] "));
}

/// Stopping while a second batch is being submitted leaves nothing behind
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_all_withRacingSubmit_shouldLeavePoolEmpty() {
    let (_, pool) = common::mock_pool(MockEndpoint::slow(20), PoolLimits::default());
    let first = TranslationBatch::from_storage(pool.clone(), common::numbered_storage(100), "fr", 2);
    let second = TranslationBatch::from_storage(pool.clone(), common::numbered_storage(100), "de", 2);

    let running = {
        let first = first.clone();
        tokio::spawn(async move { first.translate(CancellationToken::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    let submitting = {
        let second = second.clone();
        tokio::spawn(async move { second.translate(CancellationToken::new()).await })
    };

    pool.stop_all().await;

    assert_eq!(pool.live_workers(), 0);
    assert_eq!(pool.pending_count(), 0);
    assert!(!pool.is_stopping());

    assert!(matches!(running.await.unwrap(), Err(TranslationError::Cancelled)));

    // The second batch either lost its tasks to the stop or submitted after it;
    // both ways it resolves on its own
    let outcome = tokio::time::timeout(Duration::from_secs(10), submitting).await.unwrap().unwrap();
    if outcome.is_err() {
        assert_eq!(second.status(), BatchStatus::Cancelled);
    }
    pool.stop_all().await;
    assert_eq!(pool.live_workers(), 0);
    assert_eq!(pool.pending_count(), 0);
}

/// The pool is reusable after a stop
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_afterStop_shouldAcceptNewWork() {
    let (_, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    pool.stop_all().await;

    let batch = TranslationBatch::from_storage(pool.clone(), common::numbered_storage(5), "fr", 1);
    batch.translate(CancellationToken::new()).await.unwrap();

    assert_eq!(batch.status(), BatchStatus::Completed);
}

/// A panicking endpoint does not take the worker down
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_withPanickingEndpoint_shouldRequeueAndFinish() {
    let (_, pool) = common::mock_pool(MockEndpoint::panicking(1), PoolLimits::new(1, 5));
    let storage = common::numbered_storage(2);
    let batch = TranslationBatch::from_storage(pool.clone(), storage.clone(), "fr", 1);

    batch.translate(CancellationToken::new()).await.unwrap();

    assert_eq!(pool.requeued_tasks(), 1);
    assert_eq!(pool.completed_tasks(), 2);
}
