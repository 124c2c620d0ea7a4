use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::providers::TranslationEndpoint;

/// Client for the public Google translate endpoint (`client=gtx`)
#[derive(Debug)]
pub struct GoogleTranslate {
    /// Endpoint URL without query parameters
    endpoint: Url,
    /// HTTP client for making requests
    client: Client,
}

impl GoogleTranslate {
    /// Create a new client for the given endpoint URL
    ///
    /// Connections are pooled generously since up to one request per worker
    /// is in flight at any time.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(64)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    /// Create a client from the translation section of the config
    pub fn from_config(config: &TranslationConfig) -> Result<Self, ProviderError> {
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
    }

    /// Build the request URL for one translation
    pub fn request_url(&self, source_language: &str, target_language: &str, text: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client", "gtx")
            .append_pair("sl", source_language)
            .append_pair("tl", target_language)
            .append_pair("dt", "t")
            .append_pair("q", text);
        url
    }

    /// Send the request and extract the translated text
    async fn request(&self, source_language: &str, target_language: &str, text: &str) -> Result<String, ProviderError> {
        let url = self.request_url(source_language, target_language, text);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded(format!(
                "{} -> {} throttled by the endpoint",
                source_language, target_language
            )));
        }

        if !status.is_success() {
            let message = status.canonical_reason().unwrap_or("unknown status").to_string();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

        parse_response(&body).inspect_err(|e| {
            error!(
                "Malformed response for {} -> {} ({}): {}",
                source_language,
                target_language,
                e,
                body.chars().take(200).collect::<String>()
            );
        })
    }
}

/// Extract the translated text from a `translate_a/single` response body
///
/// The body is a JSON array whose first element lists the translated
/// segments; each segment is an array starting with its text. Segments
/// without a leading string are skipped.
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| ProviderError::ParseError(format!("Invalid JSON: {}", e)))?;

    let segments = json
        .as_array()
        .and_then(|root| root.first())
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::ParseError("Expected an array of translated segments".to_string()))?;

    let mut result = String::new();
    for segment in segments {
        if let Some(text) = segment.as_array().and_then(|s| s.first()).and_then(Value::as_str) {
            result.push_str(text);
        }
    }

    Ok(result)
}

#[async_trait]
impl TranslationEndpoint for GoogleTranslate {
    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        debug!("Translating {} chars {} -> {}", text.len(), source_language, target_language);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.request(source_language, target_language, text) => result,
        }
    }

    fn name(&self) -> &str {
        "google"
    }
}
