/*!
 * Batch translation processing.
 *
 * A batch owns the set of keys still waiting for a translation into one
 * language. Tasks for those keys are spread over the shared worker pool and
 * report back here; the batch resolves exactly once, either when its last
 * key is written or when it is cancelled.
 */

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;
use crate::storage::StringStorage;

use super::pool::WorkerPool;
use super::task::{Task, TaskKey, TranslationTask};

/// Resolution state of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Keys are still outstanding
    Pending,
    /// Every key was written
    Completed,
    /// The batch was cancelled before it completed
    Cancelled,
}

/// Mutable part of a batch, guarded by one lock
struct BatchState<K> {
    remaining: HashSet<K>,
    cancellation: CancellationToken,
}

/// Keys of one storage to translate into one language
pub struct TranslationBatch<K: TaskKey> {
    /// Where texts are read from and results written to
    storage: Arc<dyn StringStorage<K>>,

    /// Target language code
    language: String,

    /// Random hops per chain
    hops: usize,

    /// Pool the tasks are submitted to
    pool: WorkerPool,

    /// Remaining keys and the caller's cancellation token
    state: Mutex<BatchState<K>>,

    /// Completion signal; only ever leaves `Pending` once
    status: watch::Sender<BatchStatus>,
}

impl<K: TaskKey> TranslationBatch<K> {
    /// Create a batch over the given keys of `storage`
    pub fn new(
        pool: WorkerPool,
        storage: Arc<dyn StringStorage<K>>,
        keys: impl IntoIterator<Item = K>,
        language: impl Into<String>,
        hops: usize,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(BatchStatus::Pending);

        Arc::new(Self {
            storage,
            language: language.into(),
            hops,
            pool,
            state: Mutex::new(BatchState {
                remaining: keys.into_iter().collect(),
                cancellation: CancellationToken::new(),
            }),
            status,
        })
    }

    /// Create a batch over every key of `storage`
    pub fn from_storage(
        pool: WorkerPool,
        storage: Arc<dyn StringStorage<K>>,
        language: impl Into<String>,
        hops: usize,
    ) -> Arc<Self> {
        let keys = storage.keys();
        Self::new(pool, storage, keys, language, hops)
    }

    /// Translate every remaining key and wait for the batch to resolve
    ///
    /// Returns `Ok(())` once all keys were written and
    /// `Err(TranslationError::Cancelled)` when the batch was cancelled, either
    /// directly or through `cancel` firing while waiting.
    pub async fn translate(self: &Arc<Self>, cancel: CancellationToken) -> Result<(), TranslationError> {
        let tasks: Vec<Box<dyn TranslationTask>> = {
            let mut state = self.state.lock();
            if state.remaining.is_empty() {
                return Ok(());
            }

            state.cancellation = cancel.clone();
            state
                .remaining
                .iter()
                .map(|key| Box::new(Task::new(Arc::clone(self), key.clone())) as Box<dyn TranslationTask>)
                .collect()
        };

        let mut status = self.status.subscribe();
        info!("Translating {} keys into {}", tasks.len(), self.language);
        if !self.pool.submit(tasks) {
            self.cancel();
            return Err(TranslationError::Cancelled);
        }

        let resolved = tokio::select! {
            resolved = status.wait_for(|s| *s != BatchStatus::Pending) => resolved.map(|s| *s).ok(),
            _ = cancel.cancelled() => None,
        };

        match resolved.unwrap_or_else(|| self.cancel_and_status()) {
            BatchStatus::Completed => Ok(()),
            _ => Err(TranslationError::Cancelled),
        }
    }

    /// Resolve the batch as cancelled; no-op once resolved
    ///
    /// Running calls are not aborted; their results are ignored by the
    /// completion signal.
    pub fn cancel(&self) {
        if self.resolve(BatchStatus::Cancelled) {
            debug!("Batch into {} cancelled with {} keys left", self.language, self.remaining());
        }
    }

    /// Record the translation of `key`
    ///
    /// Keys that were already handled are ignored. Returns whether the call
    /// removed the key.
    pub fn set_result(&self, key: &K, text: String) -> bool {
        let mut state = self.state.lock();
        if !state.remaining.remove(key) {
            return false;
        }

        self.storage.set(key, text);

        if state.remaining.is_empty() && self.resolve(BatchStatus::Completed) {
            debug!("Batch into {} completed", self.language);
        }

        true
    }

    /// Drop `key` without writing anything to storage
    ///
    /// Used when the key has no text to translate. Completes the batch if it
    /// was the last key. Returns whether the call removed the key.
    pub fn skip(&self, key: &K) -> bool {
        let mut state = self.state.lock();
        if !state.remaining.remove(key) {
            return false;
        }

        if state.remaining.is_empty() && self.resolve(BatchStatus::Completed) {
            debug!("Batch into {} completed", self.language);
        }

        true
    }

    /// Number of keys not yet translated
    pub fn remaining(&self) -> usize {
        self.state.lock().remaining.len()
    }

    /// Current resolution state
    pub fn status(&self) -> BatchStatus {
        *self.status.borrow()
    }

    /// Wait until the batch resolves
    pub async fn wait(&self) -> BatchStatus {
        let mut status = self.status.subscribe();
        match status.wait_for(|s| *s != BatchStatus::Pending).await {
            Ok(s) => *s,
            Err(_) => self.status(),
        }
    }

    /// Target language code
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Random hops per chain
    pub fn hops(&self) -> usize {
        self.hops
    }

    /// The token passed to the last `translate` call
    pub fn cancellation(&self) -> CancellationToken {
        self.state.lock().cancellation.clone()
    }

    /// Whether `key` still needs a translation from this batch
    pub(crate) fn is_key_active(&self, key: &K) -> bool {
        if self.status() == BatchStatus::Cancelled {
            return false;
        }

        let state = self.state.lock();
        !state.cancellation.is_cancelled() && state.remaining.contains(key)
    }

    /// Read the current text of `key` under the batch lock
    pub(crate) fn read_text(&self, key: &K) -> Option<String> {
        let _state = self.state.lock();
        self.storage.try_get(key)
    }

    fn cancel_and_status(&self) -> BatchStatus {
        self.cancel();
        self.status()
    }

    /// Move out of `Pending`; returns whether this call did it
    fn resolve(&self, outcome: BatchStatus) -> bool {
        self.status.send_if_modified(|status| {
            if *status == BatchStatus::Pending {
                *status = outcome;
                true
            } else {
                false
            }
        })
    }
}
