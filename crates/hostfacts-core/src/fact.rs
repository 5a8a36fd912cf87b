//! Fact snapshots and their version index entries.
//!
//! A fact body is an immutable point-in-time snapshot of structured data
//! observed about a host by a named module. Each body is paired 1:1 with a
//! version entry carrying the same (timestamp, host, module) scope; the
//! version index answers temporal queries without touching payloads.
//! Neither record is ever updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest accepted module name, in characters.
pub const MAX_MODULE_LEN: usize = 50;

/// An immutable fact snapshot.
///
/// `payload` is the decoded, caller-visible tree; the storage layer keeps
/// the key-encoded form and the two never mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactBody {
  pub fact_id:   Uuid,
  pub host_id:   Uuid,
  pub module:    String,
  pub timestamp: DateTime<Utc>,
  pub payload:   serde_json::Value,
}

/// The append-only index record paired with one [`FactBody`].
///
/// For every body there is exactly one version entry with matching
/// (timestamp, host, module) referencing it, and no entry ever references
/// a nonexistent body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
  pub version_id: Uuid,
  pub host_id:    Uuid,
  pub module:     String,
  pub timestamp:  DateTime<Utc>,
  pub fact_id:    Uuid,
}

/// Input to [`crate::store::FactStore::add_fact`].
///
/// `timestamp` is caller-supplied: gatherers report observation time, and
/// out-of-order backfill is permitted.
#[derive(Debug, Clone)]
pub struct NewFact {
  pub host_id:   Uuid,
  pub timestamp: DateTime<Utc>,
  pub module:    String,
  pub payload:   serde_json::Value,
}

impl NewFact {
  pub fn new(
    host_id: Uuid,
    timestamp: DateTime<Utc>,
    module: impl Into<String>,
    payload: serde_json::Value,
  ) -> Self {
    Self { host_id, timestamp, module: module.into(), payload }
  }

  /// Reject malformed input before any write is attempted.
  pub fn validate(&self) -> Result<()> {
    if self.module.is_empty() {
      return Err(Error::EmptyModule);
    }
    if self.module.chars().count() > MAX_MODULE_LEN {
      return Err(Error::ModuleTooLong(self.module.clone()));
    }
    Ok(())
  }
}
