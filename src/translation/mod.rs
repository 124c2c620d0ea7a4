/*!
 * Concurrent poor translation engine.
 *
 * This module contains the scheduling core and the translation algorithm:
 *
 * - `chain`: multi-hop translation through random languages
 * - `formatting`: placeholder and padding repair after a chain
 * - `task`: scheduling unit, "translate key K of batch B"
 * - `batch`: keys of one storage with a single completion signal
 * - `pool`: worker pool shared by all batches
 * - `concurrency`: pool limits and defaults
 */

// Re-export main types for easier usage
pub use self::batch::{BatchStatus, TranslationBatch};
pub use self::chain::PoorTranslator;
pub use self::concurrency::PoolLimits;
pub use self::formatting::PlaceholderFixer;
pub use self::pool::WorkerPool;
pub use self::task::{Task, TaskKey, TranslationTask};

// Submodules
pub mod batch;
pub mod chain;
pub mod concurrency;
pub mod formatting;
pub mod pool;
pub mod task;
