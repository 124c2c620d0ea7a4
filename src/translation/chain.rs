/*!
 * Multi-hop "poor" translation.
 *
 * A chain sends the text through several random languages before the real
 * target language, then repairs placeholders and padding. The detour is the
 * point: every hop degrades the text a little more.
 */

use log::debug;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::{AUTO_DETECT, SUPPORTED_LANGUAGES};
use crate::providers::TranslationEndpoint;

use super::formatting::PlaceholderFixer;

/// Runs translation chains against an endpoint
pub struct PoorTranslator {
    /// Endpoint every hop is sent to
    endpoint: Arc<dyn TranslationEndpoint>,
    /// Picks hop languages
    rng: Mutex<StdRng>,
    /// Successful endpoint calls
    translations_done: AtomicU64,
}

impl PoorTranslator {
    /// Create a translator with an OS-seeded language picker
    pub fn new(endpoint: Arc<dyn TranslationEndpoint>) -> Self {
        Self::with_rng(endpoint, StdRng::from_os_rng())
    }

    /// Create a translator with a deterministic language picker
    pub fn with_seed(endpoint: Arc<dyn TranslationEndpoint>, seed: u64) -> Self {
        Self::with_rng(endpoint, StdRng::seed_from_u64(seed))
    }

    fn with_rng(endpoint: Arc<dyn TranslationEndpoint>, rng: StdRng) -> Self {
        Self {
            endpoint,
            rng: Mutex::new(rng),
            translations_done: AtomicU64::new(0),
        }
    }

    /// Number of endpoint calls that succeeded so far
    pub fn translations_done(&self) -> u64 {
        self.translations_done.load(Ordering::Relaxed)
    }

    /// The endpoint this translator calls
    pub fn endpoint(&self) -> &Arc<dyn TranslationEndpoint> {
        &self.endpoint
    }

    /// Translate `text` into `language` through `hops` random languages
    ///
    /// Every hop must succeed: a failed call or a fired token aborts the
    /// whole chain, nothing partial is returned.
    pub async fn poorly_translate(
        &self,
        language: &str,
        text: &str,
        hops: usize,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        let mut current = text.to_string();

        for hop in 1..=hops {
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            let destination = self.pick_language();
            current = self
                .translate(AUTO_DETECT, destination, &current, cancel)
                .await
                .map_err(|e| TranslationError::from_hop(hop, hops, e))?;
        }

        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        let translated = self
            .translate(AUTO_DETECT, language, &current, cancel)
            .await
            .map_err(|e| TranslationError::from_hop(hops + 1, hops, e))?;

        Ok(PlaceholderFixer::fix(text, &translated))
    }

    /// One endpoint call, counted when it succeeds
    pub async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let result = self.endpoint.translate(source_language, target_language, text, cancel).await;

        match &result {
            Ok(_) => {
                self.translations_done.fetch_add(1, Ordering::Relaxed);
            }
            Err(ProviderError::Cancelled) => {}
            Err(e) => debug!("{} call {} -> {} failed: {}", self.endpoint.name(), source_language, target_language, e),
        }

        result
    }

    fn pick_language(&self) -> &'static str {
        let index = self.rng.lock().random_range(0..SUPPORTED_LANGUAGES.len());
        SUPPORTED_LANGUAGES[index]
    }
}

impl fmt::Debug for PoorTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoorTranslator")
            .field("endpoint", &self.endpoint)
            .field("translations_done", &self.translations_done())
            .finish()
    }
}
