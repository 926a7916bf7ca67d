//! Core types for the ECU extract library
//!
//! Errors and the `Result` alias shared by the parser and the comparator.
//! Only a document that is not well-formed markup is fatal; every dangling
//! cross-reference inside a well-formed document is absorbed into an absent
//! field instead of an error.

use std::path::PathBuf;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while loading an ECU extract
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to parse ARXML document: {0}")]
    ParseError(String),

    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<roxmltree::Error> for ExtractError {
    fn from(err: roxmltree::Error) -> Self {
        ExtractError::ParseError(err.to_string())
    }
}
