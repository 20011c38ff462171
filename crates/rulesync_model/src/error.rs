//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building or decoding model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An identifier was empty or malformed.
    #[error("invalid {kind}: {message}")]
    InvalidIdentifier {
        /// Which identifier was rejected.
        kind: &'static str,
        /// Why it was rejected.
        message: String,
    },
}

impl ModelError {
    /// Creates an invalid identifier error.
    pub fn invalid_identifier(kind: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::invalid_identifier("parent key", "must not be empty");
        assert_eq!(err.to_string(), "invalid parent key: must not be empty");
    }
}
