/*!
 * Tests for error types
 */

use std::error::Error;

use poorly_translated::errors::{AppError, ProviderError, StorageError, TranslationError};

/// Test that hop errors keep their source and cancellation stays distinct
#[test]
fn test_from_hop_withProviderErrors_shouldWrapOrCancel() {
    let error = TranslationError::from_hop(3, 5, ProviderError::ConnectionError("reset".into()));
    assert!(matches!(error, TranslationError::HopFailed { hop: 3, hops: 5, .. }));
    assert!(!error.is_cancelled());
    assert!(error.source().is_some());
    assert_eq!(error.to_string(), "Hop 3 of 5 failed: Connection error: reset");

    let cancelled = TranslationError::from_hop(1, 5, ProviderError::Cancelled);
    assert!(cancelled.is_cancelled());
}

/// Test conversions into the application error
#[test]
fn test_app_error_withConversions_shouldWrap() {
    let error: AppError = ProviderError::RateLimitExceeded("slow down".into()).into();
    assert!(matches!(error, AppError::Provider(_)));

    let error: AppError = StorageError::Format("bad".into()).into();
    assert_eq!(error.to_string(), "Storage error: Invalid format: bad");

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, AppError::File(_)));

    let error: AppError = anyhow::anyhow!("odd").into();
    assert!(matches!(error, AppError::Unknown(_)));
}

/// Test API error formatting
#[test]
fn test_api_error_withStatus_shouldFormat() {
    let error = ProviderError::ApiError {
        status_code: 503,
        message: "Service Unavailable".into(),
    };
    assert_eq!(error.to_string(), "API responded with error: 503 - Service Unavailable");
}
