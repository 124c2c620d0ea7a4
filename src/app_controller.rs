use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::TranslationEndpoint;
use crate::providers::google::GoogleTranslate;
use crate::session::{AutosavePolicy, SessionStats, TranslationSession};
use crate::storage::{LocalizationTable, TranslationArchive};
use crate::translation::chain::PoorTranslator;
use crate::translation::concurrency::PoolLimits;
use crate::translation::pool::WorkerPool;

// @module: Application controller for table translation

/// How often the progress display polls the session
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Archive directory used when neither the CLI nor the config name one
const FALLBACK_ARCHIVE_DIR: &str = "Translations";

/// Outcome of one controller run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Keys in the input table
    pub total_keys: usize,
    /// Keys translated, including resumed ones
    pub translated_keys: usize,
    /// Keys restored from the archive before translating
    pub resumed_keys: usize,
    /// Successful endpoint calls
    pub translations_done: u64,
    /// Whether the run was stopped by Ctrl-C
    pub interrupted: bool,
    /// Archive file written, if any
    pub output: Option<PathBuf>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Render a progress bar on stderr
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        Ok(Self {
            config,
            show_progress: true,
        })
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // @returns: Archive directory from the argument, the config, or the user data dir
    pub fn archive_dir(&self, output_dir: Option<PathBuf>) -> PathBuf {
        output_dir
            .or_else(|| self.config.session.archive_dir.clone())
            .or_else(FileManager::default_archive_dir)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_ARCHIVE_DIR))
    }

    /// Translate the key-path JSON file `input` into the configured culture
    pub async fn run(&self, input: &Path, output_dir: Option<PathBuf>) -> Result<RunSummary> {
        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }

        let table = FileManager::load_table(input, &self.config.target_language)
            .with_context(|| format!("Failed to load input table: {:?}", input))?;
        info!("Loaded {} keys from {:?}", table.len(), input);

        let endpoint = GoogleTranslate::from_config(&self.config.translation)
            .map_err(|e| anyhow!("Failed to create translation client: {}", e))?;

        self.run_with_endpoint(Arc::new(table), self.archive_dir(output_dir), Arc::new(endpoint))
            .await
    }

    /// Translate `table` through `endpoint`, resuming from and saving to `archive_dir`
    pub async fn run_with_endpoint(
        &self,
        table: Arc<LocalizationTable>,
        archive_dir: PathBuf,
        endpoint: Arc<dyn TranslationEndpoint>,
    ) -> Result<RunSummary> {
        FileManager::ensure_dir(&archive_dir)?;

        let culture = table.culture();
        let total_keys = table.len();
        let archive = TranslationArchive::new(&archive_dir);
        let output = archive.file_for(&culture);

        let translator = Arc::new(PoorTranslator::new(endpoint));
        let pool = WorkerPool::new(translator, PoolLimits::from(&self.config.pool));
        let session = TranslationSession::new(pool, table, Some(archive))
            .with_hops(self.config.translation.hops)
            .with_autosave(AutosavePolicy::from(&self.config.session));

        let resumed_keys = session.load().context("Failed to load archived translations")?;
        if resumed_keys > 0 {
            info!("Resuming with {} of {} keys already translated", resumed_keys, total_keys);
        }

        let target = language_utils::resolve_target_language(&culture);
        debug!("Culture {} resolves to endpoint language {}", culture, target);

        let start_time = std::time::Instant::now();
        session.run().await;

        let progress_bar = self.create_progress_bar(total_keys as u64);
        let interrupted = Self::drive(&session, &progress_bar).await;

        session.update();
        let saved = session.save().context("Failed to save translations")?;
        let stats = session.stats();

        let summary = RunSummary {
            total_keys,
            translated_keys: stats.translated,
            resumed_keys,
            translations_done: stats.translations_done,
            interrupted,
            output: saved.or_else(|| output.exists().then_some(output)),
        };

        progress_bar.finish_and_clear();
        info!(
            "Translated {}/{} keys in {} ({} endpoint calls)",
            summary.translated_keys,
            summary.total_keys,
            Self::format_duration(start_time.elapsed()),
            summary.translations_done
        );

        Ok(summary)
    }

    // @loops: Poll the session until it finishes or Ctrl-C stops it
    async fn drive(session: &TranslationSession, progress_bar: &ProgressBar) -> bool {
        let finished = session.wait();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(finished, ctrl_c);

        let mut ticker = tokio::time::interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = &mut finished => return false,
                _ = &mut ctrl_c => {
                    warn!("Interrupted, stopping workers");
                    session.stop(true).await;
                    return true;
                }
                _ = ticker.tick() => {
                    session.update();
                    Self::render(progress_bar, &session.stats());
                }
            }
        }
    }

    fn create_progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} keys ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=>-"));
        progress_bar
    }

    fn render(progress_bar: &ProgressBar, stats: &SessionStats) {
        progress_bar.set_position(stats.translated as u64);
        progress_bar.set_message(format!(
            "{} queued, {} workers, {} calls",
            stats.remaining, stats.live_workers, stats.translations_done
        ));
    }

    // @formats: Duration as a short human readable string
    pub fn format_duration(duration: Duration) -> String {
        let total = duration.as_secs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);

        if h > 0 {
            format!("{}h {}m {}s", h, m, s)
        } else if m > 0 {
            format!("{}m {}s", m, s)
        } else {
            format!("{}.{:01}s", s, duration.subsec_millis() / 100)
        }
    }
}
