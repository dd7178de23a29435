//! Common error types for cuegraph

use thiserror::Error;

/// Common result type for cuegraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the conversion pipeline.
///
/// Per-document and per-track failures (unparseable cue sheets, enrichment
/// errors, unreadable audio) are contained where they occur and logged;
/// only run-level failures surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Media root resolution error
    #[error("Media root error: {0}")]
    Roots(#[from] crate::roots::RootError),

    /// Cue sheet parse failure, contained per document by the pipeline
    #[error("Parse error: {0}")]
    Parse(#[from] crate::cue::ParseError),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
