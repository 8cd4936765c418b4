//! Classification of HTTP failures into retryable and permanent ones.

use reqwest::StatusCode;
use thiserror::Error;

/// Attempts made for one request before giving up.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Failures that another attempt will not fix.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later or set PKGFINDER_INDEX_TOKEN.")]
    RateLimitExceeded(String),

    #[error("Authentication failed: {0}. Check PKGFINDER_INDEX_TOKEN.")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access forbidden: {0}. The index may need a token.")]
    Forbidden(String),

    #[error("Request error: {0}")]
    ClientError(String),
}

/// `Ok(())` when the error is transient, the permanent error otherwise.
/// Every 4xx status is permanent; 5xx and transport errors are transient.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        return Ok(());
    };
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "index page".to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(url)),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(url)),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(url)),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} from {}",
            s.as_u16(),
            url
        ))),
        _ => Ok(()),
    }
}

/// Map an `error_for_status()` failure to an `anyhow::Error`, wrapping
/// permanent failures in [`NonRetryableError`] so the retry loop stops.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
