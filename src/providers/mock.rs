/*!
 * Mock endpoint implementation for testing.
 *
 * This module provides a mock endpoint that simulates different behaviors:
 * - `MockEndpoint::working()` - Always succeeds, tagging the text with the target language
 * - `MockEndpoint::echo()` - Always succeeds, returning the text unchanged
 * - `MockEndpoint::failing()` - Always fails with an API error
 * - `MockEndpoint::panicking(n)` - Panics on the first `n` calls, then works
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::TranslationEndpoint;

/// A request received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// Source language (usually `auto`)
    pub source_language: String,
    /// Destination language
    pub target_language: String,
    /// The text to translate
    pub text: String,
}

/// Behavior mode for the mock endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[target] text`
    Working,
    /// Always succeeds with the text unchanged
    Echo,
    /// Always fails with an error
    Failing,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Fails exactly the Nth request (1-based), works otherwise
    FailOnCall { call: usize },
    /// Works after a cancellable delay
    Slow { delay_ms: u64 },
    /// Panics on the first `times` requests, works afterwards
    Panicking { times: usize },
}

/// Mock endpoint for testing translation behavior
#[derive(Debug)]
pub struct MockEndpoint {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: AtomicUsize,
    /// Requests currently being served
    in_flight: AtomicUsize,
    /// Highest number of requests served at once
    peak_in_flight: AtomicUsize,
    /// Every request received, in arrival order
    requests: Mutex<Vec<MockRequest>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockEndpoint {
    /// Create a new mock endpoint with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            custom_response: None,
        }
    }

    /// Create a working mock endpoint that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock endpoint that never changes the text
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a failing mock endpoint that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create an intermittently failing mock endpoint
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a mock endpoint that fails only its Nth call
    pub fn fail_on_call(call: usize) -> Self {
        Self::new(MockBehavior::FailOnCall { call })
    }

    /// Create a slow mock endpoint
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock endpoint that panics on its first `times` calls
    pub fn panicking(times: usize) -> Self {
        Self::new(MockBehavior::Panicking { times })
    }

    /// Set a custom response generator used whenever a call succeeds
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Get the number of requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get the highest number of requests that were in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Get a copy of every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, request: &MockRequest) -> String {
        if let Some(generator) = self.custom_response {
            return generator(request);
        }

        match self.behavior {
            MockBehavior::Echo => request.text.clone(),
            _ => format!("[{}] {}", request.target_language, request.text),
        }
    }

    async fn serve(&self, request: MockRequest, call: usize) -> Result<String, ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Mock failure".into(),
            }),
            MockBehavior::Intermittent { fail_every } if fail_every > 0 && call % fail_every == 0 => {
                Err(ProviderError::ConnectionError(format!("Mock failure on request {}", call)))
            }
            MockBehavior::FailOnCall { call: failing } if call == failing => {
                Err(ProviderError::ConnectionError(format!("Mock failure on request {}", call)))
            }
            MockBehavior::Panicking { times } if call <= times => {
                panic!("Mock endpoint panicked on request {}", call);
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(&request))
            }
            _ => Ok(self.respond(&request)),
        }
    }
}

/// Decrements the in-flight gauge even when a request panics
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationEndpoint for MockEndpoint {
    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        let request = MockRequest {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            text: text.to_string(),
        };
        self.requests.lock().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.serve(request, call) => result,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
