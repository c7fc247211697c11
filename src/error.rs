// src/error.rs

//! Unified error handling for the checker.

use std::fmt;

use thiserror::Error;

/// Result type alias for checker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// A single fetch attempt ran out of time
    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Document bytes could not be turned into text
    #[error("Failed to decode {document}: {message}")]
    Decode { document: String, message: String },

    /// Document URL is outside the allowed host
    #[error("Forbidden document host: {0}")]
    Forbidden(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error for a named document.
    pub fn decode(document: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            document: document.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a failed fetch attempt is worth repeating.
    ///
    /// Timeouts, connection failures and 5xx answers are transient;
    /// 4xx answers, malformed URLs and everything else are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => (500..600).contains(status),
            Self::Http(e) => {
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                !e.is_builder() && (e.is_timeout() || e.is_connect() || e.is_request() || e.is_body())
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = AppError::HttpStatus {
            url: "https://example.com".into(),
            status: 503,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_terminal() {
        let err = AppError::HttpStatus {
            url: "https://example.com".into(),
            status: 404,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = AppError::Timeout {
            url: "https://example.com".into(),
            timeout_ms: 10,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_bad_url_is_terminal() {
        let err = AppError::from(url::Url::parse("not a url").unwrap_err());
        assert!(!err.is_retryable());
        assert!(!AppError::config("x").is_retryable());
    }
}
