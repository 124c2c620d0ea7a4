/*!
 * Translation endpoint implementations.
 *
 * This module contains client implementations for the services the
 * translator chain can call:
 * - Google: the public `translate_a/single` endpoint
 * - Mock: scripted endpoint for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

/// Common trait for all translation endpoints
///
/// This trait defines the interface that all endpoint implementations must follow,
/// allowing them to be used interchangeably by the translator chain.
#[async_trait]
pub trait TranslationEndpoint: Send + Sync + Debug {
    /// Translate `text` from `source_language` (or `auto`) into `target_language`
    ///
    /// # Arguments
    /// * `source_language` - Source language code, or `auto` to let the service detect it
    /// * `target_language` - Destination language code
    /// * `text` - The text to translate
    /// * `cancel` - Abandons the call with `ProviderError::Cancelled` when fired
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

pub mod google;
pub mod mock;
