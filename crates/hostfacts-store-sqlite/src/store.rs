//! [`SqliteFactStore`] — the SQLite implementation of [`FactStore`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use hostfacts_core::{
  codec::KeyCodec,
  fact::{FactBody, NewFact, VersionEntry},
  host::{HostIdentity, validate_hostname},
  store::FactStore,
};

use crate::{
  Error, Result,
  config::{DatabaseLocation, StoreConfig},
  encode::{RawFactBody, RawHost, RawVersion, decode_dt, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A host fact store backed by a single SQLite database.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// database work is serialized onto the connection's dedicated thread,
/// which is the sole suspension point of every operation; no in-process
/// lock is held across it.
#[derive(Clone)]
pub struct SqliteFactStore {
  conn:  tokio_rusqlite::Connection,
  codec: KeyCodec,
}

impl SqliteFactStore {
  /// Open the store described by `config` and run schema initialisation.
  ///
  /// A connection or bootstrap failure surfaces as
  /// [`Error::Unavailable`]; it is never deferred.
  pub async fn open(config: StoreConfig) -> Result<Self> {
    let conn = match &config.database {
      DatabaseLocation::File(path) => {
        tokio_rusqlite::Connection::open(path.clone()).await
      }
      DatabaseLocation::Memory => {
        tokio_rusqlite::Connection::open_in_memory().await
      }
    }
    .map_err(Error::Unavailable)?;

    let store = Self { conn, codec: config.codec };
    store.init_schema().await?;
    debug!(database = ?config.database, "opened fact store");
    Ok(store)
  }

  /// Open an in-memory store with the default codec — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open(StoreConfig::in_memory()).await
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::Unavailable)
  }

  async fn host_exists(&self, host_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(host_id);

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM hosts WHERE host_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(exists)
  }

  // ── Version index ─────────────────────────────────────────────────────────

  /// The version entry with the greatest timestamp ≤ `as_of` in the
  /// (host, module) scope; `None` if no entry qualifies.
  ///
  /// When several entries share the maximal timestamp, the one inserted
  /// last wins (largest `seq`).
  pub async fn latest_version_before(
    &self,
    host_id: Uuid,
    module: &str,
    as_of: DateTime<Utc>,
  ) -> Result<Option<VersionEntry>> {
    let host_str  = encode_uuid(host_id);
    let module    = module.to_owned();
    let as_of_str = encode_dt(as_of);

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT version_id, host_id, module, timestamp, fact_id
               FROM fact_versions
               WHERE host_id = ?1 AND module = ?2 AND timestamp <= ?3
               ORDER BY timestamp DESC, seq DESC
               LIMIT 1",
              rusqlite::params![host_str, module, as_of_str],
              |row| {
                Ok(RawVersion {
                  version_id: row.get(0)?,
                  host_id:    row.get(1)?,
                  module:     row.get(2)?,
                  timestamp:  row.get(3)?,
                  fact_id:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_version).transpose()
  }

  /// Distinct snapshot timestamps in the (host, module) scope, newest
  /// first. The returned `Vec` can be re-iterated freely.
  pub async fn version_timeline(
    &self,
    host_id: Uuid,
    module: &str,
  ) -> Result<Vec<DateTime<Utc>>> {
    let host_str = encode_uuid(host_id);
    let module   = module.to_owned();

    let stamps: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT timestamp FROM fact_versions
           WHERE host_id = ?1 AND module = ?2
           ORDER BY timestamp DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![host_str, module], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    stamps.iter().map(|s| decode_dt(s)).collect()
  }
}

// ─── FactStore impl ──────────────────────────────────────────────────────────

impl FactStore for SqliteFactStore {
  type Error = Error;

  // ── Host registry ──────────────────────────────────────────────────────────

  async fn resolve_host(
    &self,
    hostname: &str,
    inventory_id: i64,
  ) -> Result<Option<HostIdentity>> {
    let hostname = hostname.to_owned();

    let raw: Option<RawHost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT host_id, hostname, inventory_id, created_at
               FROM hosts WHERE hostname = ?1 AND inventory_id = ?2",
              rusqlite::params![hostname, inventory_id],
              |row| {
                Ok(RawHost {
                  host_id:      row.get(0)?,
                  hostname:     row.get(1)?,
                  inventory_id: row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawHost::into_host).transpose()
  }

  async fn ensure_host(
    &self,
    hostname: &str,
    inventory_id: i64,
  ) -> Result<HostIdentity> {
    validate_hostname(hostname)?;

    let id_str   = encode_uuid(Uuid::new_v4());
    let at_str   = encode_dt(Utc::now());
    let name     = hostname.to_owned();
    let name_sel = hostname.to_owned();

    // Upsert and re-select in one serialized call: if a concurrent ensure
    // won the insert, the stored row is authoritative either way.
    let raw: RawHost = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO hosts (host_id, hostname, inventory_id, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (hostname, inventory_id) DO NOTHING",
          rusqlite::params![id_str, name, inventory_id, at_str],
        )?;
        Ok(conn.query_row(
          "SELECT host_id, hostname, inventory_id, created_at
           FROM hosts WHERE hostname = ?1 AND inventory_id = ?2",
          rusqlite::params![name_sel, inventory_id],
          |row| {
            Ok(RawHost {
              host_id:      row.get(0)?,
              hostname:     row.get(1)?,
              inventory_id: row.get(2)?,
              created_at:   row.get(3)?,
            })
          },
        )?)
      })
      .await?;

    let host = raw.into_host()?;
    debug!(
      host_id = %host.host_id,
      hostname = %host.hostname,
      inventory_id,
      "ensured host identity"
    );
    Ok(host)
  }

  // ── Ingestion ──────────────────────────────────────────────────────────────

  async fn add_fact(&self, input: NewFact) -> Result<(FactBody, VersionEntry)> {
    input.validate()?;

    if !self.host_exists(input.host_id).await? {
      return Err(Error::Core(hostfacts_core::Error::HostNotFound(
        input.host_id,
      )));
    }

    let encoded = self.codec.encode(&input.payload)?;

    let body = FactBody {
      fact_id:   Uuid::new_v4(),
      host_id:   input.host_id,
      module:    input.module.clone(),
      timestamp: input.timestamp,
      payload:   input.payload,
    };
    let version = VersionEntry {
      version_id: Uuid::new_v4(),
      host_id:    input.host_id,
      module:     input.module,
      timestamp:  input.timestamp,
      fact_id:    body.fact_id,
    };

    let fact_id_str    = encode_uuid(body.fact_id);
    let version_id_str = encode_uuid(version.version_id);
    let host_id_str    = encode_uuid(body.host_id);
    let module         = body.module.clone();
    let ts_str         = encode_dt(body.timestamp);
    let payload_str    = encoded.to_string();

    // Body first, then the version entry, within one serialized call:
    // readers observe both or neither. If the second insert fails the
    // whole call fails and the body row stays behind unreferenced; a
    // version entry pointing nowhere can never exist.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fact_bodies (fact_id, host_id, module, timestamp, payload_json)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![fact_id_str, host_id_str, module, ts_str, payload_str],
        )?;
        conn.execute(
          "INSERT INTO fact_versions (version_id, host_id, module, timestamp, fact_id)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![version_id_str, host_id_str, module, ts_str, fact_id_str],
        )?;
        Ok(())
      })
      .await?;

    debug!(
      fact_id = %body.fact_id,
      host_id = %body.host_id,
      module = %body.module,
      "recorded fact snapshot"
    );
    Ok((body, version))
  }

  // ── Queries ────────────────────────────────────────────────────────────────

  async fn get_host_version(
    &self,
    hostname: &str,
    inventory_id: i64,
    as_of: DateTime<Utc>,
    module: &str,
  ) -> Result<Option<FactBody>> {
    let Some(host) = self.resolve_host(hostname, inventory_id).await? else {
      return Ok(None);
    };

    let host_str  = encode_uuid(host.host_id);
    let module    = module.to_owned();
    let as_of_str = encode_dt(as_of);

    let raw: Option<RawFactBody> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT b.fact_id, b.host_id, b.module, b.timestamp, b.payload_json
               FROM fact_versions v
               JOIN fact_bodies b ON b.fact_id = v.fact_id
               WHERE v.host_id = ?1 AND v.module = ?2 AND v.timestamp <= ?3
               ORDER BY v.timestamp DESC, v.seq DESC
               LIMIT 1",
              rusqlite::params![host_str, module, as_of_str],
              |row| {
                Ok(RawFactBody {
                  fact_id:      row.get(0)?,
                  host_id:      row.get(1)?,
                  module:       row.get(2)?,
                  timestamp:    row.get(3)?,
                  payload_json: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_body(&self.codec)).transpose()
  }

  async fn get_host_timeline(
    &self,
    hostname: &str,
    inventory_id: i64,
    module: &str,
  ) -> Result<Option<Vec<DateTime<Utc>>>> {
    let Some(host) = self.resolve_host(hostname, inventory_id).await? else {
      return Ok(None);
    };

    Ok(Some(self.version_timeline(host.host_id, module).await?))
  }

  async fn get_single_facts(
    &self,
    hostnames: &[String],
    fact_key: &str,
    fact_value: &serde_json::Value,
    as_of: DateTime<Utc>,
    module: &str,
  ) -> Result<Option<Vec<FactBody>>> {
    if hostnames.is_empty() {
      return Ok(None);
    }

    // The filter addresses stored field names, which are key-encoded.
    let path   = self.codec.encode_query_path(fact_key)?;
    let wanted = self.codec.encode(fact_value)?;

    // Stage 1: batched hostname resolution; unknown names drop out.
    // Matching is by hostname alone, across inventories, as on the
    // ingest side of the bulk query.
    let names: Vec<String> = hostnames.to_vec();
    let host_ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=names.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let sql =
          format!("SELECT host_id FROM hosts WHERE hostname IN ({placeholders})");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(names.iter()), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    if host_ids.is_empty() {
      return Ok(None);
    }

    // Stage 2: one batched pass over the version index for every resolved
    // host. Rows arrive grouped per host with the winning candidate first
    // (timestamp, then insertion order), so the first row per host is that
    // host's latest-before.
    let module    = module.to_owned();
    let as_of_str = encode_dt(as_of);
    let raws: Vec<RawFactBody> = self
      .conn
      .call(move |conn| {
        let n = host_ids.len();
        let placeholders = (1..=n)
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let sql = format!(
          "SELECT b.fact_id, v.host_id, b.module, b.timestamp, b.payload_json
           FROM fact_versions v
           JOIN fact_bodies b ON b.fact_id = v.fact_id
           WHERE v.host_id IN ({placeholders})
             AND v.module = ?{} AND v.timestamp <= ?{}
           ORDER BY v.host_id, v.timestamp DESC, v.seq DESC",
          n + 1,
          n + 2,
        );
        let mut stmt = conn.prepare(&sql)?;
        let params = host_ids.iter().cloned().chain([module, as_of_str]);
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawFactBody {
              fact_id:      row.get(0)?,
              host_id:      row.get(1)?,
              module:       row.get(2)?,
              timestamp:    row.get(3)?,
              payload_json: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut latest: Vec<RawFactBody> = Vec::new();
    for raw in raws {
      if seen.insert(raw.host_id.clone()) {
        latest.push(raw);
      }
    }

    // Stage 3: equality filter on the encoded field, then decode. An
    // absent field or a mismatched nested type is "no match", not an
    // error.
    let mut matches = Vec::new();
    for raw in latest {
      let stored: serde_json::Value = serde_json::from_str(&raw.payload_json)?;
      if lookup_path(&stored, &path) == Some(&wanted) {
        matches.push(raw.into_body(&self.codec)?);
      }
    }

    if matches.is_empty() { Ok(None) } else { Ok(Some(matches)) }
  }
}

/// Walk `value` down a sequence of map keys; `None` as soon as a segment
/// is absent or an intermediate value is not a map.
fn lookup_path<'v>(
  value: &'v serde_json::Value,
  path: &[String],
) -> Option<&'v serde_json::Value> {
  let mut current = value;
  for segment in path {
    current = current.as_object()?.get(segment)?;
  }
  Some(current)
}
