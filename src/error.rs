//! Crate-wide error type.
//!
//! The anti-cheat core never produces these; they come from the storage,
//! CSV and configuration edges around it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Grid id that is not one of the supported presets
    #[error("unknown grid preset: {0}")]
    UnknownGrid(String),

    /// Month key that is not `YYYY-MM`
    #[error("invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    /// Required submission form field left empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Submission blocked because the run failed the plausibility checks
    #[error("irregular run detected; replay the grid to submit a time")]
    IrregularRun,

    /// Submission attempted before the grid was completed
    #[error("grid is not complete")]
    NotComplete,
}
