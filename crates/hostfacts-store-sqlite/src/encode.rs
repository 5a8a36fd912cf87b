//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings at microsecond
//! precision so that lexicographic comparison in SQL matches chronological
//! order. UUIDs are stored as hyphenated lowercase strings. Payloads are
//! stored as compact JSON in their key-encoded form.

use chrono::{DateTime, SecondsFormat, Utc};
use hostfacts_core::{
  codec::KeyCodec,
  fact::{FactBody, VersionEntry},
  host::HostIdentity,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `hosts` row.
pub struct RawHost {
  pub host_id:      String,
  pub hostname:     String,
  pub inventory_id: i64,
  pub created_at:   String,
}

impl RawHost {
  pub fn into_host(self) -> Result<HostIdentity> {
    Ok(HostIdentity {
      host_id:      decode_uuid(&self.host_id)?,
      hostname:     self.hostname,
      inventory_id: self.inventory_id,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `fact_bodies` row.
pub struct RawFactBody {
  pub fact_id:      String,
  pub host_id:      String,
  pub module:       String,
  pub timestamp:    String,
  pub payload_json: String,
}

impl RawFactBody {
  /// Materialise the caller-visible body; payload keys are restored
  /// through `codec`.
  pub fn into_body(self, codec: &KeyCodec) -> Result<FactBody> {
    let stored: serde_json::Value = serde_json::from_str(&self.payload_json)?;
    Ok(FactBody {
      fact_id:   decode_uuid(&self.fact_id)?,
      host_id:   decode_uuid(&self.host_id)?,
      module:    self.module,
      timestamp: decode_dt(&self.timestamp)?,
      payload:   codec.decode(&stored),
    })
  }
}

/// Raw strings read directly from a `fact_versions` row.
pub struct RawVersion {
  pub version_id: String,
  pub host_id:    String,
  pub module:     String,
  pub timestamp:  String,
  pub fact_id:    String,
}

impl RawVersion {
  pub fn into_version(self) -> Result<VersionEntry> {
    Ok(VersionEntry {
      version_id: decode_uuid(&self.version_id)?,
      host_id:    decode_uuid(&self.host_id)?,
      module:     self.module,
      timestamp:  decode_dt(&self.timestamp)?,
      fact_id:    decode_uuid(&self.fact_id)?,
    })
  }
}
