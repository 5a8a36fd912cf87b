//! Store configuration.
//!
//! Connection parameters are an explicit value handed to
//! [`SqliteFactStore::open`](crate::SqliteFactStore::open) — there is no
//! ambient or process-global connection state.

use std::path::PathBuf;

use hostfacts_core::codec::KeyCodec;

/// Where the SQLite database lives.
#[derive(Debug, Clone, Default)]
pub enum DatabaseLocation {
  /// A database file on disk, created on first open.
  File(PathBuf),
  /// A private in-memory database; useful for tests.
  #[default]
  Memory,
}

/// Construction-time configuration for
/// [`SqliteFactStore`](crate::SqliteFactStore).
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
  pub database: DatabaseLocation,
  /// The key substitution table applied to every payload and query
  /// filter.
  pub codec:    KeyCodec,
}

impl StoreConfig {
  /// A file-backed store with the default codec.
  pub fn file(path: impl Into<PathBuf>) -> Self {
    Self {
      database: DatabaseLocation::File(path.into()),
      codec:    KeyCodec::default(),
    }
  }

  /// An in-memory store with the default codec.
  pub fn in_memory() -> Self { Self::default() }
}
