//! Error types for `care-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown field type: {0:?}")]
  UnknownFieldType(String),

  #[error("invalid date range: {0:?}")]
  InvalidDateRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
