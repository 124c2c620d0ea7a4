/*!
 * Culture-tagged localization table and the storage view batches use.
 *
 * The table is owned by the host and only changes on its tick. Batches never
 * write into it directly: their results are buffered by the storage view and
 * applied by `flush()`, which the host calls from its update loop.
 */

use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use super::StringStorage;

/// Keys translated so far, shared between a session and its storages
pub type TranslatedKeys = Arc<Mutex<HashSet<String>>>;

/// Key to text table for the currently active culture
#[derive(Debug)]
pub struct LocalizationTable {
    culture: RwLock<String>,
    texts: RwLock<BTreeMap<String, String>>,
}

impl LocalizationTable {
    /// Create an empty table for `culture`
    pub fn new(culture: impl Into<String>) -> Self {
        Self {
            culture: RwLock::new(culture.into()),
            texts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a table for `culture` holding `entries`
    pub fn with_entries(culture: impl Into<String>, entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let table = Self::new(culture);
        table.texts.write().extend(entries);
        table
    }

    /// Active culture name, e.g. `fr-FR`
    pub fn culture(&self) -> String {
        self.culture.read().clone()
    }

    /// Switch the active culture; texts are left to the host to reload
    pub fn set_culture(&self, culture: impl Into<String>) {
        *self.culture.write() = culture.into();
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.texts.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.texts.read().contains_key(key)
    }

    /// Replace the text of an existing key; unknown keys are ignored
    pub fn set(&self, key: &str, text: String) -> bool {
        match self.texts.write().get_mut(key) {
            Some(slot) => {
                *slot = text;
                true
            }
            None => false,
        }
    }

    /// Insert or replace a key
    pub fn insert(&self, key: impl Into<String>, text: impl Into<String>) {
        self.texts.write().insert(key.into(), text.into());
    }

    /// Every key, sorted
    pub fn keys(&self) -> Vec<String> {
        self.texts.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.texts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.read().is_empty()
    }

    /// Copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.texts.read().clone()
    }
}

/// Storage view over a `LocalizationTable` for one culture
///
/// Reads see nothing once the table switched to another culture. Writes go
/// to a buffer and the shared translated-key set until `flush()`.
#[derive(Debug)]
pub struct LocalizationStorage {
    table: Arc<LocalizationTable>,
    culture: String,
    buffer: Mutex<HashMap<String, String>>,
    translated: TranslatedKeys,
}

impl LocalizationStorage {
    /// Create a view for the table's current culture
    pub fn new(table: Arc<LocalizationTable>, translated: TranslatedKeys) -> Self {
        let culture = table.culture();
        Self {
            table,
            culture,
            buffer: Mutex::new(HashMap::new()),
            translated,
        }
    }

    /// Culture this view was created for
    pub fn culture(&self) -> &str {
        &self.culture
    }

    pub fn table(&self) -> &Arc<LocalizationTable> {
        &self.table
    }

    /// Whether the table still shows this view's culture
    pub fn is_current(&self) -> bool {
        self.table.culture() == self.culture
    }

    /// Writes waiting for `flush()`
    pub fn buffered(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Apply buffered writes to the table
    ///
    /// Returns the number of texts written. Writes for a culture that is no
    /// longer active are discarded.
    pub fn flush(&self) -> usize {
        let pending = std::mem::take(&mut *self.buffer.lock());
        if pending.is_empty() {
            return 0;
        }

        if !self.is_current() {
            debug!("Discarding {} buffered {} texts after culture change", pending.len(), self.culture);
            return 0;
        }

        pending
            .into_iter()
            .filter(|(key, text)| self.table.set(key, text.clone()))
            .count()
    }
}

impl StringStorage<String> for LocalizationStorage {
    fn keys(&self) -> Vec<String> {
        self.table.keys()
    }

    fn try_get(&self, key: &String) -> Option<String> {
        if !self.is_current() {
            return None;
        }
        self.table.get(key)
    }

    fn set(&self, key: &String, text: String) {
        self.buffer.lock().insert(key.clone(), text);
        self.translated.lock().insert(key.clone());
    }
}
