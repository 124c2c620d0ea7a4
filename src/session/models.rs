/*!
 * Plain data used by translation sessions.
 */

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use crate::app_config::SessionConfig;

/// Group name for keys without a `.`
pub const UNKNOWN_GROUP: &str = "Unknown";

/// When the session writes its archive on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosavePolicy {
    /// Save as soon as more than this many keys were translated since the last save
    pub min_keys: usize,
    /// Save any new keys once this much time passed since the last save
    pub interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            min_keys: 200,
            interval: Duration::from_secs(10),
        }
    }
}

impl From<&SessionConfig> for AutosavePolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            min_keys: config.autosave_min_keys,
            interval: Duration::from_secs(config.autosave_interval_secs),
        }
    }
}

/// Progress of autosaving, updated on each host tick
#[derive(Debug, Clone, Copy)]
pub struct AutosaveTracker {
    last_count: usize,
    last_save: Instant,
}

impl AutosaveTracker {
    pub fn new() -> Self {
        Self {
            last_count: 0,
            last_save: Instant::now(),
        }
    }

    /// Decide whether `count` translated keys call for a save now
    ///
    /// A positive answer records the save.
    pub fn should_save(&mut self, policy: &AutosavePolicy, count: usize, now: Instant) -> bool {
        let new_keys = count.saturating_sub(self.last_count);
        let due = new_keys > policy.min_keys
            || (new_keys > 0 && now.duration_since(self.last_save) > policy.interval);

        if due {
            self.last_count = count;
            self.last_save = now;
        }
        due
    }

    /// Forget previous saves, e.g. after the translated set was cleared
    pub fn reset(&mut self, count: usize) {
        self.last_count = count;
        self.last_save = Instant::now();
    }
}

impl Default for AutosaveTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a session for status displays
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub running: bool,
    /// Keys still queued across all batches
    pub remaining: usize,
    /// Keys translated in the current culture
    pub translated: usize,
    pub live_workers: usize,
    /// Successful endpoint calls
    pub translations_done: u64,
}

/// Name of the group `key` belongs to: everything before the first `.`
pub fn group_of(key: &str) -> &str {
    match key.find('.') {
        Some(dot) => &key[..dot],
        None => UNKNOWN_GROUP,
    }
}

/// Group keys that still need translating
///
/// Empty keys and keys already in `translated` are left out.
pub fn group_keys<'a>(
    keys: impl IntoIterator<Item = &'a String>,
    translated: &HashSet<String>,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for key in keys {
        if key.is_empty() || translated.contains(key) {
            continue;
        }
        groups.entry(group_of(key).to_string()).or_default().push(key.clone());
    }

    groups
}
