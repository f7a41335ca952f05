//! Error types for video_globe

use thiserror::Error;

/// Main error type for globe session operations
#[derive(Error, Debug)]
pub enum GlobeError {
    #[error("Source error: {0}")]
    Source(#[from] crate::source::SourceError),

    #[error("Cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for globe session operations
pub type Result<T> = std::result::Result<T, GlobeError>;
