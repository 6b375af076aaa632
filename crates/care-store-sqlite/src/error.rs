//! Error type for `care-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value no domain type accepts.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("person not found: {0}")]
  PersonNotFound(uuid::Uuid),

  #[error("care type not found: {0}")]
  CareTypeNotFound(uuid::Uuid),

  #[error("care item not found: {0}")]
  CareItemNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
