//! Batch-level error type.
//!
//! Anything in here aborts an import before the first row is processed. Row
//! problems never surface as a [`PipelineError`]; they are collected as
//! [`crate::report::ImportError`] values instead.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The payload had no header row.
    #[error("input is empty: expected a header row")]
    EmptyInput,

    /// The payload exceeded the configured size ceiling.
    #[error("input is {size} bytes, exceeding the {limit} byte limit")]
    InputTooLarge { size: u64, limit: u64 },

    /// The payload is not valid text in the configured encoding.
    #[error("input could not be decoded as {encoding}")]
    Decode { encoding: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
