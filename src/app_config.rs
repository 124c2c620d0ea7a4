use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

use crate::translation::concurrency::{DEFAULT_HOPS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WORKERS};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Culture name of the output (e.g. `fr-FR`), resolved to an endpoint language
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation chain config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Worker pool config
    #[serde(default)]
    pub pool: PoolConfig,

    /// Session and archive config
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation endpoint and chain settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Endpoint URL of the translate service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Random intermediate languages per chain
    #[serde(default = "default_hops")]
    pub hops: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            hops: default_hops(),
        }
    }
}

/// Worker pool settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    /// Maximum number of concurrently live workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Full chain attempts per task before keeping the original text
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Session settings: autosave policy and archive location
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Save once more than this many keys were translated since the last save
    #[serde(default = "default_autosave_min_keys")]
    pub autosave_min_keys: usize,

    /// Save any new keys once this many seconds passed since the last save
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,

    /// Directory holding `{culture}.json` archives (platform data dir when unset)
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_min_keys: default_autosave_min_keys(),
            autosave_interval_secs: default_autosave_interval_secs(),
            archive_dir: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "fr-FR".to_string()
}

fn default_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_hops() -> usize {
    DEFAULT_HOPS
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_autosave_min_keys() -> usize {
    200
}

fn default_autosave_interval_secs() -> u64 {
    10
}

impl Config {
    /// Load the configuration from `path`, writing the default one if it doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .context(format!("Failed to open config file: {}", path.display()))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;

            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(path, config_json)
            .context(format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language cannot be empty"));
        }

        Url::parse(&self.translation.endpoint)
            .context(format!("Invalid translation endpoint: {}", self.translation.endpoint))?;

        if self.translation.timeout_secs == 0 {
            return Err(anyhow!("Translation timeout must be at least one second"));
        }

        if self.pool.max_workers == 0 || self.pool.max_workers > 256 {
            return Err(anyhow!(
                "Worker count must be between 1 and 256, got {}",
                self.pool.max_workers
            ));
        }

        if self.pool.max_attempts == 0 {
            return Err(anyhow!("At least one translation attempt per key is required"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            pool: PoolConfig::default(),
            session: SessionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
