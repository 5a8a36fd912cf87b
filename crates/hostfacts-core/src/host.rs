//! Host identity — the stable internal identity of a managed host.
//!
//! A host is keyed by `(hostname, inventory_id)`. The registry creates an
//! identity the first time a fact is written for a never-seen pair; this
//! crate never mutates or deletes one (host lifecycle is owned by
//! inventory management).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest accepted hostname, in characters.
pub const MAX_HOSTNAME_LEN: usize = 100;

/// The stable identity every fact and version entry is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
  pub host_id:      Uuid,
  pub hostname:     String,
  pub inventory_id: i64,
  pub created_at:   DateTime<Utc>,
}

/// Reject malformed hostnames before any write is attempted.
pub fn validate_hostname(hostname: &str) -> Result<()> {
  if hostname.is_empty() {
    return Err(Error::EmptyHostname);
  }
  if hostname.chars().count() > MAX_HOSTNAME_LEN {
    return Err(Error::HostnameTooLong(hostname.to_owned()));
  }
  Ok(())
}
