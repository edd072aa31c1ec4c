use crate::types::RowIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Required column '{name}' not found in header")]
    MissingColumn { name: String },

    #[error("Invalid date at line {line}: '{value}'")]
    InvalidDate { line: u64, value: String },

    #[error("Invalid number in column '{column}' at line {line}: '{value}'")]
    InvalidNumber { line: u64, column: &'static str, value: String },

    #[error("Invalid event at row {row}: {reason}")]
    InvalidEvent { row: RowIndex, reason: String },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: chrono::NaiveDate, end: chrono::NaiveDate },

    #[error("Delimiter {delimiter:?} is not a single-byte character")]
    InvalidDelimiter { delimiter: char },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DashResult<T> = Result<T, DashError>;
