/*!
 * Key to text storages that batches read from and write to.
 *
 * - `MemoryStorage`: a plain in-memory map
 * - `localization`: a culture-tagged table with a buffered view over it
 * - `archive`: JSON files of already translated keys
 */

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::translation::task::TaskKey;

pub mod archive;
pub mod localization;

pub use archive::TranslationArchive;
pub use localization::{LocalizationStorage, LocalizationTable};

/// Narrow view over an externally owned key to text mapping
///
/// Implementations serialize their own reads and writes.
pub trait StringStorage<K: TaskKey>: Send + Sync {
    /// Every key currently present
    fn keys(&self) -> Vec<K>;

    /// Current text of `key`, if present
    fn try_get(&self, key: &K) -> Option<String>;

    /// Replace the text of `key`
    fn set(&self, key: &K, text: String);
}

/// In-memory storage backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryStorage<K: TaskKey> {
    entries: RwLock<HashMap<K, String>>,
}

impl<K: TaskKey> MemoryStorage<K> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, String)>) -> Self {
        Self {
            entries: RwLock::new(pairs.into_iter().collect()),
        }
    }

    pub fn get(&self, key: &K) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry
    pub fn snapshot(&self) -> HashMap<K, String> {
        self.entries.read().clone()
    }
}

impl<K: TaskKey> StringStorage<K> for MemoryStorage<K> {
    fn keys(&self) -> Vec<K> {
        self.entries.read().keys().cloned().collect()
    }

    fn try_get(&self, key: &K) -> Option<String> {
        self.get(key)
    }

    fn set(&self, key: &K, text: String) {
        self.entries.write().insert(key.clone(), text);
    }
}
