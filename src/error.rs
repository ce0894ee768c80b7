use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised at the edges of the engine.
///
/// Classification and rule evaluation never fail on cell content; the only
/// core failure is a dataset whose rows disagree on their column keys.
#[derive(Debug, Error)]
pub enum Error {
    #[error("row {row} has columns [{found}], expected [{expected}]")]
    InconsistentColumns {
        row: usize,
        expected: String,
        found: String,
    },

    #[error("invalid input data: {0}")]
    InvalidInput(String),

    #[error("failed to parse JSON input")]
    Json(#[from] serde_json::Error),

    #[error("failed to read CSV input")]
    Csv(#[from] csv::Error),

    #[error("invalid page request: {0}")]
    InvalidPage(String),

    #[error("column '{0}' not found")]
    UnknownColumn(String),

    #[error("failed to load config from {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
