/*!
 * Worker pool concurrency tuning.
 *
 * The translate endpoint is network bound and answers small requests, so the
 * pool runs many cheap workers instead of a few heavy ones.
 */

/// Maximum number of concurrently live workers
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// Full chain attempts per task before the original text is kept
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Random intermediate languages per chain
pub const DEFAULT_HOPS: usize = 5;

/// Pool limits with tuned defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    /// Maximum concurrently live workers
    pub max_workers: usize,
    /// Chain attempts per task
    pub max_attempts: usize,
}

impl PoolLimits {
    /// Build limits, clamping zero values to one
    pub fn new(max_workers: usize, max_attempts: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Number of workers to add so that `live` reaches `min(pending, max_workers)`
    pub fn workers_to_spawn(&self, pending: usize, live: usize) -> usize {
        pending.min(self.max_workers).saturating_sub(live)
    }

    /// Hop count to use for a task, treating zero as the default
    pub fn effective_hops(hops: usize) -> usize {
        if hops == 0 { DEFAULT_HOPS } else { hops }
    }
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS, DEFAULT_MAX_ATTEMPTS)
    }
}

impl From<&crate::app_config::PoolConfig> for PoolLimits {
    fn from(config: &crate::app_config::PoolConfig) -> Self {
        Self::new(config.max_workers, config.max_attempts)
    }
}
