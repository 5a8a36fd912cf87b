//! Error types for `hostfacts-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("hostname must not be empty")]
  EmptyHostname,

  #[error("hostname longer than 100 characters: {0:?}")]
  HostnameTooLong(String),

  #[error("module must not be empty")]
  EmptyModule,

  #[error("module longer than 50 characters: {0:?}")]
  ModuleTooLong(String),

  /// A write referenced a host identity the registry has never created.
  #[error("host not found: {0}")]
  HostNotFound(Uuid),

  /// A payload key already contains a substitute code point, so it could
  /// not be decoded back to its original form after encoding.
  #[error("payload key {key:?} contains reserved substitute {substitute:?}")]
  ReservedKey { key: String, substitute: char },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
