//! Error types for Tubetalk.

use thiserror::Error;

/// Library-level error type for Tubetalk operations.
#[derive(Error, Debug)]
pub enum TubetalkError {
    #[error("Invalid YouTube video ID or URL: {0}")]
    InvalidIdentifier(String),

    #[error("No transcript available for this video")]
    TranscriptUnavailable,

    #[error("The video is unavailable")]
    VideoUnavailable,

    #[error("Transcript fetching failed: {0}")]
    TranscriptFetch(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

/// Result type alias for Tubetalk operations.
pub type Result<T> = std::result::Result<T, TubetalkError>;
