/*!
 * JSON archive of translated keys.
 *
 * One file per culture. Keys are dotted paths (`Items.Sword.Name`) stored as
 * nested objects:
 *
 * ```json
 * { "Items": { "Sword": { "Name": "Epee" } } }
 * ```
 *
 * Besides `{culture}.json`, files named `{culture}.<anything>.json` are read
 * too, so translations can be split across files.
 */

use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::StorageError;

use super::localization::LocalizationTable;

/// Leaf of an archive file
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Dotted key path
    pub key: String,
    /// Translated text
    pub text: String,
}

/// Directory of per-culture translation files
#[derive(Debug, Clone)]
pub struct TranslationArchive {
    dir: PathBuf,
}

impl TranslationArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file `save` writes for `culture`
    pub fn file_for(&self, culture: &str) -> PathBuf {
        self.dir.join(format!("{}.json", culture))
    }

    /// Files holding translations for `culture`, sorted by name
    pub fn culture_files(&self, culture: &str) -> Result<Vec<PathBuf>, StorageError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let exact = format!("{}.json", culture);
        let prefix = format!("{}.", culture);

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_file() && (name == exact || (name.starts_with(&prefix) && name.ends_with(".json"))) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Apply every archived translation for `culture` to `table`
    ///
    /// Returns the keys that were applied. Unreadable files are logged and
    /// skipped; entries with an empty key or a key the table does not know
    /// are logged and ignored.
    pub fn load(&self, culture: &str, table: &LocalizationTable) -> Result<HashSet<String>, StorageError> {
        let mut loaded = HashSet::new();

        for path in self.culture_files(culture)? {
            let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

            let root = match read_object(&path) {
                Ok(root) => root,
                Err(e) => {
                    error!("Error while reading {} translations: {}", name, e);
                    continue;
                }
            };

            for entry in flatten_entries(&root) {
                if entry.key.is_empty() {
                    warn!("Got empty key from {}", name);
                    continue;
                }
                if !table.set(&entry.key, entry.text) {
                    warn!("Got nonexistent key {} from {}", entry.key, name);
                    continue;
                }
                loaded.insert(entry.key);
            }
        }

        if !loaded.is_empty() {
            info!("Loaded {} archived {} translations", loaded.len(), culture);
        }

        Ok(loaded)
    }

    /// Write the current table text of every key in `keys` to `{culture}.json`
    ///
    /// Returns the written path, or `None` when there was nothing to save.
    pub fn save(
        &self,
        culture: &str,
        keys: &HashSet<String>,
        table: &LocalizationTable,
    ) -> Result<Option<PathBuf>, StorageError> {
        if keys.is_empty() {
            return Ok(None);
        }

        let mut entries: Vec<(String, String)> = keys
            .iter()
            .filter_map(|key| table.get(key).map(|text| (key.clone(), text)))
            .collect();
        entries.sort();

        let tree = build_tree(entries.iter().map(|(k, t)| (k.as_str(), t.as_str())));

        fs::create_dir_all(&self.dir)?;
        let path = self.file_for(culture);
        fs::write(&path, serde_json::to_string_pretty(&tree)?)?;

        debug!("Saved {} translations to {}", entries.len(), path.display());
        Ok(Some(path))
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, StorageError> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    match value {
        Value::Object(root) => Ok(root),
        _ => Err(StorageError::Format("expected a JSON object".to_string())),
    }
}

/// Walk nested objects, joining keys with `.`
///
/// Only string leaves are returned; other values are ignored.
pub fn flatten_entries(root: &Map<String, Value>) -> Vec<ArchiveEntry> {
    fn walk(object: &Map<String, Value>, path: &mut String, out: &mut Vec<ArchiveEntry>) {
        for (key, value) in object {
            let mark = path.len();
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(key);

            match value {
                Value::Object(child) => walk(child, path, out),
                Value::String(text) => out.push(ArchiveEntry {
                    key: path.clone(),
                    text: text.clone(),
                }),
                _ => {}
            }

            path.truncate(mark);
        }
    }

    let mut out = Vec::new();
    walk(root, &mut String::new(), &mut out);
    out
}

/// Nest dotted keys into objects
///
/// An existing object is reused when a segment matches it ignoring case. A
/// scalar in the way of a deeper key is replaced by an object.
pub fn build_tree<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Value {
    let mut root = Map::new();
    for (key, text) in entries {
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &segments, text);
    }
    Value::Object(root)
}

fn insert_path(node: &mut Map<String, Value>, segments: &[&str], text: &str) {
    match segments {
        [] => {}
        [last] => {
            node.insert(last.to_string(), Value::String(text.to_string()));
        }
        [segment, rest @ ..] => {
            let lowered = segment.to_lowercase();
            let key = node
                .iter()
                .find(|(k, v)| v.is_object() && k.to_lowercase() == lowered)
                .map(|(k, _)| k.clone())
                .unwrap_or_else(|| segment.to_string());

            let slot = node.entry(key).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_path(child, rest, text);
            }
        }
    }
}
