//! Central error handling for style application
//!
//! Provides a unified StyleError enum with one variant per failure kind so
//! callers can tell a bad document apart from a bad target layer or a
//! missing sprite.

use serde_json::Value;

/// Centralized error type for all style application operations
#[derive(thiserror::Error, Debug)]
pub enum StyleError {
    #[error("Malformed style: {0}")]
    MalformedStyle(#[from] serde_json::Error),

    #[error("Unsupported style version: expected {expected}, found {found}")]
    UnsupportedVersion { expected: u64, found: Value },

    #[error("Unsupported layer type: {0}")]
    UnsupportedLayerType(String),

    #[error("Source '{source_name}' is not usable: expected {expected}, found {found}")]
    SourceTypeMismatch {
        source_name: String,
        expected: String,
        found: String,
    },

    #[error("Sprite not found: {url} ({reason})")]
    SpriteNotFound { url: String, reason: String },

    #[error("Sprite image {url} failed to load: {reason}")]
    SpriteImage { url: String, reason: String },
}

impl StyleError {
    /// Short stable label used as a log prefix
    pub fn category(&self) -> &'static str {
        match self {
            StyleError::MalformedStyle(_) => "MalformedStyle",
            StyleError::UnsupportedVersion { .. } => "UnsupportedVersion",
            StyleError::UnsupportedLayerType(_) => "UnsupportedLayerType",
            StyleError::SourceTypeMismatch { .. } => "SourceTypeMismatch",
            StyleError::SpriteNotFound { .. } => "SpriteNotFound",
            StyleError::SpriteImage { .. } => "SpriteImage",
        }
    }

    /// Convenience constructors for common error types
    pub fn layer_type<T: ToString>(msg: T) -> Self {
        StyleError::UnsupportedLayerType(msg.to_string())
    }

    pub fn source_mismatch<N, E, F>(source_name: N, expected: E, found: F) -> Self
    where
        N: ToString,
        E: ToString,
        F: ToString,
    {
        StyleError::SourceTypeMismatch {
            source_name: source_name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn sprite_not_found<U: ToString, R: ToString>(url: U, reason: R) -> Self {
        StyleError::SpriteNotFound {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn sprite_image<U: ToString, R: ToString>(url: U, reason: R) -> Self {
        StyleError::SpriteImage {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for style operations
pub type StyleResult<T> = Result<T, StyleError>;
