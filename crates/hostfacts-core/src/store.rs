//! The `FactStore` trait — the caller-facing surface of the fact cache.
//!
//! Implemented by storage backends (e.g. `hostfacts-store-sqlite`). The
//! gatherer and web layers depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  fact::{FactBody, NewFact, VersionEntry},
  host::HostIdentity,
};

/// Abstraction over a host fact store backend.
///
/// All writes are append-only; no operation updates or deletes a record.
/// Absence on reads is modelled as `None`, never as an error — only
/// infrastructure failures surface through `Self::Error`.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes. Dropping a returned future before
/// completion never exposes a partial result to any caller.
pub trait FactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Host registry ─────────────────────────────────────────────────────

  /// Look up the identity for `(hostname, inventory_id)`.
  ///
  /// Read-only: never creates an identity as a side effect. `None` if the
  /// pair has never been seen.
  fn resolve_host<'a>(
    &'a self,
    hostname: &'a str,
    inventory_id: i64,
  ) -> impl Future<Output = Result<Option<HostIdentity>, Self::Error>> + Send + 'a;

  /// Return the identity for `(hostname, inventory_id)`, creating it on
  /// first use.
  ///
  /// This is the one creation path for host identities, invoked by
  /// gatherers ahead of [`add_fact`](Self::add_fact). Idempotent: every
  /// subsequent call with the same pair returns the same identity.
  fn ensure_host<'a>(
    &'a self,
    hostname: &'a str,
    inventory_id: i64,
  ) -> impl Future<Output = Result<HostIdentity, Self::Error>> + Send + 'a;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Persist one fact snapshot and its paired version entry.
  ///
  /// The payload is key-encoded on the way in. The body is written first,
  /// then the version entry, and readers observe both together. A failure
  /// on the second write fails the whole call; it can leave an
  /// unreferenced body row behind, never a version entry pointing
  /// nowhere.
  ///
  /// Duplicate (host, module, timestamp) writes are accepted; the
  /// read-side tie-break resolves them deterministically.
  fn add_fact(
    &self,
    input: NewFact,
  ) -> impl Future<Output = Result<(FactBody, VersionEntry), Self::Error>> + Send + '_;

  // ── Queries ───────────────────────────────────────────────────────────

  /// The decoded snapshot in effect at `as_of` for one host: the version
  /// with the greatest timestamp ≤ `as_of` in the (host, module) scope.
  ///
  /// Unknown host or no qualifying version → `None`.
  fn get_host_version<'a>(
    &'a self,
    hostname: &'a str,
    inventory_id: i64,
    as_of: DateTime<Utc>,
    module: &'a str,
  ) -> impl Future<Output = Result<Option<FactBody>, Self::Error>> + Send + 'a;

  /// All snapshot timestamps for one (host, module) scope, distinct and
  /// newest-first. Unknown host → `None`.
  fn get_host_timeline<'a>(
    &'a self,
    hostname: &'a str,
    inventory_id: i64,
    module: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<DateTime<Utc>>>, Self::Error>> + Send + 'a;

  /// For each named host, its latest snapshot at or before `as_of` in
  /// `module`, kept only when the payload field at the dot-style path
  /// `fact_key` equals `fact_value`.
  ///
  /// Hostnames with no identity are silently dropped. Each host
  /// contributes at most one body, even when several versions share the
  /// maximal timestamp. `None` when nothing qualifies.
  fn get_single_facts<'a>(
    &'a self,
    hostnames: &'a [String],
    fact_key: &'a str,
    fact_value: &'a serde_json::Value,
    as_of: DateTime<Utc>,
    module: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<FactBody>>, Self::Error>> + Send + 'a;
}
