/*!
 * Error types for the lyrisync crate.
 *
 * This module contains custom error types for different parts of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 *
 * Note that lyric parsing itself never fails with an error: a parser that
 * cannot make sense of its input returns no document, which callers treat
 * as a legitimate "lyrics not found" state. The types here cover the
 * strict helper surfaces (timestamp parsing) and the CLI boundary.
 */

use thiserror::Error;

/// Errors that can occur in strict parsing helpers
#[derive(Error, Debug)]
pub enum ParseError {
    /// A timestamp string did not match any accepted clock form
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// The payload matched no supported lyric format
    #[error("Unrecognized lyric format")]
    UnrecognizedFormat,

    /// The XML layer rejected a TTML payload
    #[error("XML error: {0}")]
    Xml(String),
}

/// Errors that can occur while driving a sync session
#[derive(Error, Debug)]
pub enum SyncError {
    /// A tick referenced a line index outside the document
    #[error("Line index {0} out of range")]
    LineOutOfRange(usize),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from lyric parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error from the sync engine
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
