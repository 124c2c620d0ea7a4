/*!
 * # poorly-translated
 *
 * A Rust library for deliberately bad machine translation of localization
 * tables.
 *
 * ## Features
 *
 * - Every text is sent through several random languages before the target
 *   language
 * - `{placeholders}` and surrounding padding survive the detour
 * - A shared worker pool translates many batches concurrently, with retries,
 *   cancellation and exactly-once completion per batch
 * - Translated keys are archived as JSON and skipped on the next run
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `translation`: the scheduling core:
 *   - `translation::pool`: worker pool and pending tasks
 *   - `translation::batch`: batches and their completion signal
 *   - `translation::task`: per-key tasks
 *   - `translation::chain`: multi-hop translation
 *   - `translation::formatting`: placeholder repair
 * - `storage`: key to text storages, localization tables and the archive
 * - `session`: drives a whole table through the pool
 * - `providers`: translation endpoints (Google, mock)
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `language_utils`: Supported languages and culture resolution
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod session;
pub mod storage;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ProviderError, StorageError, TranslationError};
pub use language_utils::{get_language_name, resolve_target_language};
pub use session::TranslationSession;
pub use storage::{LocalizationTable, MemoryStorage, StringStorage};
pub use translation::{PoorTranslator, TranslationBatch, WorkerPool};
