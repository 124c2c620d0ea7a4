/*!
 * Worker pool shared by every translation batch.
 *
 * Pending tasks of all batches live in one bag. Workers are spawned lazily
 * when tasks are submitted, each repeatedly takes a random task out of the
 * bag, and a worker retires as soon as it finds the bag empty. At most
 * `max_workers` are alive at once.
 */

use futures::FutureExt;
use futures::future::join_all;
use log::{debug, error, warn};
use parking_lot::Mutex;
use rand::Rng;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;

use super::chain::PoorTranslator;
use super::concurrency::PoolLimits;
use super::task::TranslationTask;

/// Unordered collection of pending tasks with random removal
#[derive(Default)]
pub struct TaskBag {
    tasks: Vec<Box<dyn TranslationTask>>,
}

impl TaskBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Box<dyn TranslationTask>) {
        self.tasks.push(task);
    }

    pub fn extend(&mut self, tasks: impl IntoIterator<Item = Box<dyn TranslationTask>>) {
        self.tasks.extend(tasks);
    }

    /// Remove and return a uniformly random task
    pub fn take_random(&mut self) -> Option<Box<dyn TranslationTask>> {
        if self.tasks.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.tasks.len());
        Some(self.tasks.swap_remove(index))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove every task
    pub fn drain(&mut self) -> Vec<Box<dyn TranslationTask>> {
        std::mem::take(&mut self.tasks)
    }
}

/// Bag plus the bookkeeping that must change together with it
#[derive(Default)]
struct PendingState {
    bag: TaskBag,
    /// Workers spawned and not yet retired
    live: usize,
    stopping: bool,
}

struct Workers {
    handles: Vec<JoinHandle<()>>,
    /// Interrupts every worker spawned since the last stop
    shutdown: CancellationToken,
}

struct PoolInner {
    translator: Arc<PoorTranslator>,
    limits: PoolLimits,
    /// Held for the whole of `stop_all`, so stops never overlap
    stop_lock: tokio::sync::Mutex<()>,
    workers: Mutex<Workers>,
    pending: Mutex<PendingState>,
    completed: AtomicU64,
    requeued: AtomicU64,
}

/// Outcome of running one task through its attempts
enum Attempt {
    /// Accepted text to report back
    Translated(String),
    /// The batch was cancelled; drop the task
    Cancelled,
    /// The chain panicked; requeue the task
    Panicked(TranslationError),
    /// The pool is stopping; cancel the task's batch and exit the worker
    Shutdown,
}

/// Handle to the pool; clones share the same workers and pending tasks
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Create an idle pool; no worker runs until tasks are submitted
    pub fn new(translator: Arc<PoorTranslator>, limits: PoolLimits) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                translator,
                limits,
                stop_lock: tokio::sync::Mutex::new(()),
                workers: Mutex::new(Workers {
                    handles: Vec::new(),
                    shutdown: CancellationToken::new(),
                }),
                pending: Mutex::new(PendingState::default()),
                completed: AtomicU64::new(0),
                requeued: AtomicU64::new(0),
            }),
        }
    }

    /// Queue tasks and make sure enough workers run them
    ///
    /// Tasks submitted while a stop is in progress are discarded and `false`
    /// is returned.
    pub fn submit(&self, tasks: Vec<Box<dyn TranslationTask>>) -> bool {
        {
            let mut pending = self.inner.pending.lock();
            if pending.stopping {
                debug!("Pool is stopping, discarding {} submitted tasks", tasks.len());
                return false;
            }
            pending.bag.extend(tasks);
        }

        self.poke();
        true
    }

    /// Spawn workers until `min(pending, max_workers)` are live
    pub fn poke(&self) {
        self.inner.poke();
    }

    /// Cancel all pending work and wait for every worker to exit
    pub async fn stop_all(&self) {
        let _stopping = self.inner.stop_lock.lock().await;

        let dropped = {
            let mut pending = self.inner.pending.lock();
            pending.stopping = true;
            pending.bag.drain()
        };
        for task in &dropped {
            task.cancel();
        }

        let handles = {
            let mut workers = self.inner.workers.lock();
            workers.shutdown.cancel();
            std::mem::take(&mut workers.handles)
        };

        if !dropped.is_empty() || !handles.is_empty() {
            debug!("Stopping pool: {} pending tasks dropped, {} workers to join", dropped.len(), handles.len());
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Worker ended abnormally: {}", e);
            }
        }

        let mut workers = self.inner.workers.lock();
        workers.shutdown = CancellationToken::new();
        self.inner.pending.lock().stopping = false;
    }

    /// Workers currently alive
    pub fn live_workers(&self) -> usize {
        self.inner.pending.lock().live
    }

    /// Tasks waiting for a worker
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().bag.len()
    }

    pub fn is_stopping(&self) -> bool {
        self.inner.pending.lock().stopping
    }

    /// Tasks whose result was reported back to their batch
    pub fn completed_tasks(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Tasks put back after a worker failure
    pub fn requeued_tasks(&self) -> u64 {
        self.inner.requeued.load(Ordering::Relaxed)
    }

    /// The translator every worker uses
    pub fn translator(&self) -> &Arc<PoorTranslator> {
        &self.inner.translator
    }

    pub fn limits(&self) -> PoolLimits {
        self.inner.limits
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("limits", &self.inner.limits)
            .field("live_workers", &self.live_workers())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl PoolInner {
    fn poke(self: &Arc<Self>) {
        let mut workers = self.workers.lock();
        workers.handles.retain(|handle| !handle.is_finished());

        let spawn = {
            let mut pending = self.pending.lock();
            if pending.stopping {
                return;
            }
            let spawn = self.limits.workers_to_spawn(pending.bag.len(), pending.live);
            pending.live += spawn;
            spawn
        };

        for _ in 0..spawn {
            let inner = Arc::clone(self);
            let shutdown = workers.shutdown.clone();
            workers.handles.push(tokio::spawn(run_worker(inner, shutdown)));
        }

        if spawn > 0 {
            debug!("Spawned {} workers ({} live)", spawn, workers.handles.len());
        }
    }

    /// Take the next active task, or retire the worker if there is none
    fn claim_next(&self, slot: &mut WorkerSlot<'_>) -> Option<Box<dyn TranslationTask>> {
        let mut pending = self.pending.lock();
        if pending.stopping {
            return None;
        }

        while let Some(task) = pending.bag.take_random() {
            if task.is_active() {
                return Some(task);
            }
        }

        pending.live -= 1;
        slot.disarm();
        None
    }

    fn requeue(&self, task: Box<dyn TranslationTask>) {
        let mut pending = self.pending.lock();
        if !pending.stopping && task.is_active() {
            pending.bag.push(task);
            self.requeued.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Run the chain up to `max_attempts` times
    ///
    /// The first result that differs from `text` ignoring case wins. When no
    /// attempt changes the text, the original is accepted as is.
    async fn attempt_task(
        &self,
        task: &dyn TranslationTask,
        text: &str,
        shutdown: &CancellationToken,
    ) -> Attempt {
        let cancel = task.cancellation();
        let hops = PoolLimits::effective_hops(task.hops());
        let language = task.language();

        for attempt in 1..=self.limits.max_attempts {
            if !task.is_active() {
                return Attempt::Cancelled;
            }

            let chain = AssertUnwindSafe(self.translator.poorly_translate(language, text, hops, &cancel)).catch_unwind();
            let outcome = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Attempt::Shutdown,
                outcome = chain => outcome,
            };

            match outcome {
                Err(payload) => return Attempt::Panicked(TranslationError::WorkerPanicked(panic_message(&*payload))),
                Ok(Ok(result)) if result.to_lowercase() != text.to_lowercase() => return Attempt::Translated(result),
                Ok(Ok(_)) => debug!("Attempt {} for {} left the text unchanged", attempt, task.describe()),
                Ok(Err(e)) if e.is_cancelled() => return Attempt::Cancelled,
                Ok(Err(e)) => warn!("Attempt {} for {} failed: {}", attempt, task.describe(), e),
            }
        }

        debug!("Keeping original text for {}", task.describe());
        Attempt::Translated(text.to_string())
    }
}

/// Counts a worker as live until it retires
///
/// A worker that retires through `claim_next` disarms the slot there, under
/// the same lock that saw the empty bag. Any other exit releases it on drop.
struct WorkerSlot<'a> {
    inner: &'a PoolInner,
    armed: bool,
}

impl WorkerSlot<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for WorkerSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.pending.lock().live -= 1;
        }
    }
}

async fn run_worker(inner: Arc<PoolInner>, shutdown: CancellationToken) {
    let mut slot = WorkerSlot {
        inner: &inner,
        armed: true,
    };

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let Some(task) = inner.claim_next(&mut slot) else {
            break;
        };

        let Some(text) = task.text() else {
            warn!("No text for {}, skipping", task.describe());
            task.skip();
            continue;
        };

        match inner.attempt_task(task.as_ref(), &text, &shutdown).await {
            Attempt::Translated(result) => {
                if !task.cancellation().is_cancelled() && task.set_result(result) {
                    inner.completed.fetch_add(1, Ordering::Relaxed);
                }
            }
            Attempt::Cancelled => {}
            Attempt::Panicked(e) => {
                error!("{} while translating {}", e, task.describe());
                inner.requeue(task);
            }
            Attempt::Shutdown => {
                task.cancel();
                break;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
