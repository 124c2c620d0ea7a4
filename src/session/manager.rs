/*!
 * Session driver for translating a localization table.
 *
 * This module handles:
 * - Splitting the untranslated keys into one batch per key group
 * - Resuming from the archive and skipping keys translated before
 * - Flushing buffered results and autosaving on the host tick
 * - Stopping every batch and worker at once
 */

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::StorageError;
use crate::language_utils::resolve_target_language;
use crate::storage::localization::TranslatedKeys;
use crate::storage::{LocalizationStorage, LocalizationTable, TranslationArchive};
use crate::translation::batch::TranslationBatch;
use crate::translation::concurrency::DEFAULT_HOPS;
use crate::translation::pool::WorkerPool;

use super::models::{AutosavePolicy, AutosaveTracker, SessionStats, group_keys};

/// Mutable session state, guarded by one lock
struct SessionState {
    /// Culture the translated-key set belongs to
    culture: Option<String>,
    /// Batches still running, by group name
    batches: HashMap<String, Arc<TranslationBatch<String>>>,
    /// Storage view shared by the batches of the current run
    storage: Option<Arc<LocalizationStorage>>,
    /// Fired by `stop`
    cancellation: CancellationToken,
    drivers: Vec<JoinHandle<()>>,
    autosave: AutosaveTracker,
}

/// Parts shared with the driver tasks
struct Shared {
    table: Arc<LocalizationTable>,
    archive: Option<TranslationArchive>,
    translated: TranslatedKeys,
    state: Mutex<SessionState>,
    /// `true` while a run is in progress
    running: watch::Sender<bool>,
}

/// Translates every key of a localization table through a worker pool
pub struct TranslationSession {
    pool: WorkerPool,
    hops: usize,
    autosave: AutosavePolicy,
    shared: Arc<Shared>,
}

impl TranslationSession {
    /// Create an idle session over `table`, persisting into `archive` if given
    pub fn new(pool: WorkerPool, table: Arc<LocalizationTable>, archive: Option<TranslationArchive>) -> Self {
        let (running, _) = watch::channel(false);

        Self {
            pool,
            hops: DEFAULT_HOPS,
            autosave: AutosavePolicy::default(),
            shared: Arc::new(Shared {
                table,
                archive,
                translated: TranslatedKeys::default(),
                state: Mutex::new(SessionState {
                    culture: None,
                    batches: HashMap::new(),
                    storage: None,
                    cancellation: CancellationToken::new(),
                    drivers: Vec::new(),
                    autosave: AutosaveTracker::new(),
                }),
                running,
            }),
        }
    }

    pub fn with_hops(mut self, hops: usize) -> Self {
        self.hops = hops;
        self
    }

    pub fn with_autosave(mut self, policy: AutosavePolicy) -> Self {
        self.autosave = policy;
        self
    }

    pub fn table(&self) -> &Arc<LocalizationTable> {
        &self.shared.table
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Start translating every key not translated yet
    ///
    /// A running session is stopped (and saved) first. Returns as soon as the
    /// batches are submitted; use `wait` to block until they finish.
    pub async fn run(&self) {
        if self.is_running() {
            self.stop(true).await;
        }

        let culture = self.shared.table.culture();
        let target = resolve_target_language(&culture);

        let mut state = self.shared.state.lock();
        if state.culture.as_deref() != Some(culture.as_str()) {
            let mut translated = self.shared.translated.lock();
            if !translated.is_empty() {
                debug!("Culture changed to {}, forgetting {} translated keys", culture, translated.len());
            }
            translated.clear();
            state.autosave.reset(0);
        }
        state.culture = Some(culture.clone());
        state.cancellation = CancellationToken::new();

        let groups = {
            let translated = self.shared.translated.lock();
            group_keys(&self.shared.table.keys(), &translated)
        };

        if groups.is_empty() {
            info!("Nothing left to translate for {}", culture);
            return;
        }

        let storage = Arc::new(LocalizationStorage::new(
            Arc::clone(&self.shared.table),
            Arc::clone(&self.shared.translated),
        ));
        state.storage = Some(Arc::clone(&storage));
        self.shared.running.send_replace(true);

        info!(
            "Translating {} groups of {} into {} ({})",
            groups.len(),
            culture,
            target,
            crate::language_utils::get_language_name(&target)
        );

        for (group, keys) in groups {
            let batch = TranslationBatch::new(self.pool.clone(), storage.clone(), keys, target.clone(), self.hops);
            state.batches.insert(group.clone(), Arc::clone(&batch));

            let driver = drive_batch(Arc::clone(&self.shared), group, batch, state.cancellation.clone());
            state.drivers.push(tokio::spawn(driver));
        }
    }

    /// Stop every batch and worker
    ///
    /// Waits for all workers to exit. Saves the archive when `save` is set
    /// and a run was in progress.
    pub async fn stop(&self, save: bool) {
        let drivers = {
            let mut state = self.shared.state.lock();
            state.cancellation.cancel();
            state.batches.clear();
            std::mem::take(&mut state.drivers)
        };
        let was_running = self.shared.running.send_replace(false);

        self.pool.stop_all().await;

        for driver in drivers {
            if let Err(e) = driver.await {
                error!("Batch driver ended abnormally: {}", e);
            }
        }

        if was_running {
            info!("Translation stopped with {} keys translated", self.translated_count());
            if save {
                if let Err(e) = self.save() {
                    error!("Failed to save translations: {}", e);
                }
            }
        }
    }

    /// Restore archived translations of the table's culture
    ///
    /// Returns the number of keys restored.
    pub fn load(&self) -> Result<usize, StorageError> {
        let Some(archive) = &self.shared.archive else {
            return Ok(0);
        };

        let culture = self.shared.table.culture();
        let loaded = archive.load(&culture, &self.shared.table)?;
        let count = loaded.len();

        {
            let mut state = self.shared.state.lock();
            let mut translated = self.shared.translated.lock();
            *translated = loaded;
            state.culture = Some(culture);
            state.autosave.reset(count);
        }

        Ok(count)
    }

    /// Write translated keys to the archive
    pub fn save(&self) -> Result<Option<PathBuf>, StorageError> {
        self.shared.save()
    }

    /// Host tick: spawn workers, apply buffered results, autosave
    pub fn update(&self) {
        self.pool.poke();
        self.shared.flush();

        if !self.is_running() {
            return;
        }

        let count = self.translated_count();
        let due = self.shared.state.lock().autosave.should_save(&self.autosave, count, Instant::now());
        if due {
            match self.save() {
                Ok(Some(path)) => debug!("Autosaved {} keys to {}", count, path.display()),
                Ok(None) => {}
                Err(e) => warn!("Autosave failed: {}", e),
            }
        }
    }

    /// Keys still queued across all batches
    pub fn remaining(&self) -> usize {
        self.shared.state.lock().batches.values().map(|b| b.remaining()).sum()
    }

    pub fn is_running(&self) -> bool {
        *self.shared.running.borrow()
    }

    /// Wait until the current run finished or was stopped
    pub async fn wait(&self) {
        let mut running = self.shared.running.subscribe();
        let _ = running.wait_for(|running| !running).await;
    }

    /// Keys translated in the current culture
    pub fn translated_count(&self) -> usize {
        self.shared.translated.lock().len()
    }

    /// Copy of the translated-key set
    pub fn translated_keys(&self) -> HashSet<String> {
        self.shared.translated.lock().clone()
    }

    /// Counters for status displays
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            running: self.is_running(),
            remaining: self.remaining(),
            translated: self.translated_count(),
            live_workers: self.pool.live_workers(),
            translations_done: self.pool.translator().translations_done(),
        }
    }
}

impl Shared {
    fn flush(&self) -> usize {
        let storage = self.state.lock().storage.clone();
        storage.map(|s| s.flush()).unwrap_or(0)
    }

    fn save(&self) -> Result<Option<PathBuf>, StorageError> {
        self.flush();

        let Some(archive) = &self.archive else {
            return Ok(None);
        };

        let culture = self.state.lock().culture.clone().unwrap_or_else(|| self.table.culture());
        let keys = self.translated.lock().clone();
        archive.save(&culture, &keys, &self.table)
    }
}

/// Run one batch and retire it from the session when it completes
async fn drive_batch(
    shared: Arc<Shared>,
    group: String,
    batch: Arc<TranslationBatch<String>>,
    cancel: CancellationToken,
) {
    if batch.translate(cancel.clone()).await.is_err() {
        debug!("Batch {} cancelled", group);
        return;
    }

    let finished = {
        let mut state = shared.state.lock();
        if cancel.is_cancelled() {
            return;
        }
        if state.batches.get(&group).is_some_and(|b| Arc::ptr_eq(b, &batch)) {
            state.batches.remove(&group);
        }
        state.batches.is_empty()
    };

    debug!("Batch {} completed", group);

    if finished && *shared.running.borrow() {
        info!("Translation finished");
        if let Err(e) = shared.save() {
            error!("Failed to save translations: {}", e);
        }
        shared.running.send_replace(false);
    }
}
