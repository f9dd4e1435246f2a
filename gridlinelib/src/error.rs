//! Error types for gridlinelib

use thiserror::Error;

/// Errors that can occur while building, exporting or rendering a table
#[derive(Error, Debug)]
pub enum GridlineError {
    /// A column-addressed operation was called without any column names
    #[error("{0}: provide at least one column name")]
    NoColumns(&'static str),

    /// None of the given column names matched a header cell
    #[error("{0}: no such columns")]
    UnknownColumns(&'static str),

    /// Titles must not be empty
    #[error("cannot add an empty title")]
    EmptyTitle,

    /// Footnotes must not be empty
    #[error("cannot add an empty footnote")]
    EmptyFootnote,

    /// Row index outside the table
    #[error("no such row: {0}")]
    RowOutOfRange(usize),

    /// No row carries the requested name
    #[error("no such row name '{0}'")]
    RowNotFound(String),

    /// Header and footer rows cannot be removed
    #[error("cannot remove the header or footer row")]
    ProtectedRow,

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to or reading from the sink failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
