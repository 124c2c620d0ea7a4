use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::LocalizationTable;
use crate::storage::archive::flatten_entries;

// @module: File and directory utilities

/// Application directory name under the user data dir
const APP_DIR: &str = "poorly-translated";

/// Archive directory name inside the application directory
const ARCHIVE_DIR: &str = "Translations";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    // @reads: A file that must hold a JSON object
    pub fn read_json_object<P: AsRef<Path>>(path: P) -> Result<Map<String, Value>> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;
        let value: Value =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON file: {:?}", path))?;

        match value {
            Value::Object(root) => Ok(root),
            _ => Err(anyhow!("Expected a JSON object in {:?}", path)),
        }
    }

    /// Load a nested key-path JSON file as a localization table for `culture`
    pub fn load_table<P: AsRef<Path>>(path: P, culture: &str) -> Result<LocalizationTable> {
        let root = Self::read_json_object(path)?;
        let entries = flatten_entries(&root).into_iter().map(|e| (e.key, e.text));
        Ok(LocalizationTable::with_entries(culture, entries))
    }

    // @returns: Default archive location under the user data dir
    pub fn default_archive_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR).join(ARCHIVE_DIR))
    }
}
