//! Error types for the web compatibility checker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid snapshot at '{path}': {message}")]
    InvalidSnapshot { path: String, message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Unknown browser: {id}")]
    UnknownBrowser { id: String },
}

pub type Result<T> = std::result::Result<T, CompatError>;

impl CompatError {
    pub fn snapshot(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_message() {
        let err = CompatError::snapshot("css.properties.color", "expected an object");
        assert_eq!(
            err.to_string(),
            "Invalid snapshot at 'css.properties.color': expected an object"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CompatError = json_err.into();
        assert!(matches!(err, CompatError::Json(_)));
    }
}
