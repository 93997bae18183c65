//! Custom error types for bioanswer.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PipelineError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for bioanswer operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
/// The `Keyword`, `Search` and `Synthesis` variants tag a failure with the pipeline
/// stage it occurred in; the remaining variants are transport-level and get wrapped
/// into a stage variant before they reach the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Keyword extraction failed (generative model call)
    #[error("Keyword generation failed: {0}")]
    Keyword(String),

    /// Literature search failed
    #[error("Search upstream failed: {0}")]
    Search(String),

    /// Answer synthesis failed (generative model call)
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML/XML/response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code from API
        code: i32,
        /// Error message from API
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `PipelineError`
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| PipelineError::Parse(msg.to_string()))
    }
}
