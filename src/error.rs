//! Custom error types for litscreen.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, ScreenError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for litscreen operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Missing or invalid configuration (context, input file, batch size)
    #[error("Config error: {0}")]
    Config(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Model API returned a non-retryable error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code from the API
        code: i32,
        /// Error message from the API
        message: String,
    },

    /// Rate limited by the model API (429 / RESOURCE_EXHAUSTED)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Model API temporarily unavailable (503 / SERVICE_UNAVAILABLE)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Model response could not be parsed into verdicts
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias using `ScreenError`
pub type Result<T> = std::result::Result<T, ScreenError>;
