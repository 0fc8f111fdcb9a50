//! Error types for Symdex core operations.
//!
//! Library code returns `SymdexError` through the `Result` alias; the CLI
//! wraps these in `anyhow` for reporting. Almost every error here is
//! recoverable: a bad file or a bad pattern costs its own symbols and nothing
//! else.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using SymdexError
pub type Result<T> = std::result::Result<T, SymdexError>;

/// Core error types for Symdex operations.
#[derive(Error, Debug)]
pub enum SymdexError {
    // === Scan Errors ===
    /// The file could not be read while scanning it
    #[error("cannot scan {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    /// The file looks binary (NUL bytes or invalid UTF-8)
    #[error("binary or non-UTF-8 file: {path}")]
    BinaryFile { path: PathBuf },

    // === Pattern Errors ===
    /// A symbol or exclusion pattern failed to compile
    #[error("invalid pattern: {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === Configuration Errors ===
    /// Settings file parsing failed
    #[error("configuration error: {reason}")]
    Config { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Internal Errors ===
    /// Internal error that should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl SymdexError {
    /// Returns true if this error should only drop the offending file or
    /// pattern instead of failing the surrounding operation.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            SymdexError::Scan { .. }
                | SymdexError::BinaryFile { .. }
                | SymdexError::InvalidPattern { .. }
        )
    }

    /// Create a scan error for `path`
    pub fn scan(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SymdexError::Scan {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid pattern error from a regex compile failure
    pub fn invalid_pattern(pattern: impl Into<String>, err: &regex::Error) -> Self {
        SymdexError::InvalidPattern {
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_skippable() {
        let err = SymdexError::scan("/tmp/a.py", "permission denied");
        assert!(err.is_skippable());

        let err = SymdexError::BinaryFile {
            path: PathBuf::from("/tmp/a.bin"),
        };
        assert!(err.is_skippable());

        let err = SymdexError::Config {
            reason: "bad toml".to_string(),
        };
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_invalid_pattern_message() {
        let re_err = regex::Regex::new("(").unwrap_err();
        let err = SymdexError::invalid_pattern("(", &re_err);
        assert!(err.to_string().starts_with("invalid pattern: ("));
    }
}
