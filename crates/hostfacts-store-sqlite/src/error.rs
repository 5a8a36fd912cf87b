//! Error type for `hostfacts-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] hostfacts_core::Error),

  /// The database could not be opened or its schema initialised.
  /// A retryable infrastructure failure, distinct from any "no data"
  /// outcome.
  #[error("storage unavailable: {0}")]
  Unavailable(tokio_rusqlite::Error),

  /// A query-time transport or execution failure. Always propagated,
  /// never folded into an empty result.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
