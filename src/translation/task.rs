/*!
 * Scheduling units handed to the worker pool.
 *
 * A task is "translate key K of batch B". It carries no state of its own:
 * every answer comes from its batch, which is what lets the pool drop a
 * task the moment its batch finished or was cancelled.
 */

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::batch::TranslationBatch;

/// Bounds on keys that batches and tasks can be built over
pub trait TaskKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<K> TaskKey for K where K: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Object-safe view of a task, so the pool can mix keys of any type
pub trait TranslationTask: Send + Sync {
    /// Whether the task still needs doing
    fn is_active(&self) -> bool;

    /// Current text of the key, if storage still has it
    fn text(&self) -> Option<String>;

    /// Target language of the batch
    fn language(&self) -> &str;

    /// Hop count of the batch
    fn hops(&self) -> usize;

    /// Cancellation token of the batch
    fn cancellation(&self) -> CancellationToken;

    /// Cancel the whole batch
    fn cancel(&self);

    /// Report the accepted translation; returns whether the batch took it
    fn set_result(&self, text: String) -> bool;

    /// Give up on the key without a translation
    fn skip(&self) -> bool;

    /// Human readable identity for log lines
    fn describe(&self) -> String;
}

/// Translate `key` of `batch`
pub struct Task<K: TaskKey> {
    batch: Arc<TranslationBatch<K>>,
    key: K,
}

impl<K: TaskKey> Task<K> {
    pub fn new(batch: Arc<TranslationBatch<K>>, key: K) -> Self {
        Self { batch, key }
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: TaskKey> TranslationTask for Task<K> {
    fn is_active(&self) -> bool {
        self.batch.is_key_active(&self.key)
    }

    fn text(&self) -> Option<String> {
        self.batch.read_text(&self.key)
    }

    fn language(&self) -> &str {
        self.batch.language()
    }

    fn hops(&self) -> usize {
        self.batch.hops()
    }

    fn cancellation(&self) -> CancellationToken {
        self.batch.cancellation()
    }

    fn cancel(&self) {
        self.batch.cancel();
    }

    fn set_result(&self, text: String) -> bool {
        self.batch.set_result(&self.key, text)
    }

    fn skip(&self) -> bool {
        self.batch.skip(&self.key)
    }

    fn describe(&self) -> String {
        format!("{:?} ({})", self.key, self.batch.language())
    }
}
