/*!
 * Translation sessions over a localization table.
 *
 * This module provides:
 * - Grouping of keys into one batch per group
 * - Resume from archived translations
 * - Autosave and stop handling for the host loop
 */

pub mod manager;
pub mod models;

// Re-export main types
pub use manager::TranslationSession;
pub use models::{AutosavePolicy, SessionStats, group_keys};
