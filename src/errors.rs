/*!
 * Error types for the poorly-translated application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation endpoint
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The call was abandoned because its cancellation token fired
    #[error("Request cancelled")]
    Cancelled,
}

/// Errors that can occur while translating a string or a batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// One hop of a translation chain failed, which fails the whole attempt
    #[error("Hop {hop} of {hops} failed: {source}")]
    HopFailed {
        /// 1-based index of the failing call (hops + 1 is the final call)
        hop: usize,
        /// Number of random hops in the chain
        hops: usize,
        /// Underlying endpoint error
        #[source]
        source: ProviderError,
    },

    /// The operation was cancelled
    #[error("Translation cancelled")]
    Cancelled,

    /// A worker caught a panic while processing a task
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),
}

impl TranslationError {
    /// Wrap an endpoint error raised by a hop, keeping cancellation distinct
    pub fn from_hop(hop: usize, hops: usize, source: ProviderError) -> Self {
        match source {
            ProviderError::Cancelled => Self::Cancelled,
            source => Self::HopFailed { hop, hops, source },
        }
    }

    /// Whether this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors that can occur while reading or writing persisted translations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error from the file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while (de)serializing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The persisted data does not have the expected shape
    #[error("Invalid format: {0}")]
    Format(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from persisted storage
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
