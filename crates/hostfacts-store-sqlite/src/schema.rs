//! SQL schema for the hostfacts SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS hosts (
    host_id      TEXT PRIMARY KEY,
    hostname     TEXT NOT NULL,
    inventory_id INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (hostname, inventory_id)
);

-- Fact bodies are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS fact_bodies (
    fact_id      TEXT PRIMARY KEY,
    host_id      TEXT NOT NULL REFERENCES hosts(host_id),
    module       TEXT NOT NULL,
    timestamp    TEXT NOT NULL,   -- fixed-width RFC 3339 UTC; lexicographic = chronological
    payload_json TEXT NOT NULL    -- key-encoded JSON document
);

-- Append-only version index, one row per fact body. `seq` records
-- insertion order and breaks ties between entries sharing a timestamp:
-- the largest seq wins.
CREATE TABLE IF NOT EXISTS fact_versions (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id TEXT NOT NULL UNIQUE,
    host_id    TEXT NOT NULL REFERENCES hosts(host_id),
    module     TEXT NOT NULL,
    timestamp  TEXT NOT NULL,
    fact_id    TEXT NOT NULL REFERENCES fact_bodies(fact_id)
);

CREATE INDEX IF NOT EXISTS fact_bodies_host_idx    ON fact_bodies(host_id, timestamp DESC);
CREATE INDEX IF NOT EXISTS fact_versions_scope_idx ON fact_versions(host_id, module, timestamp DESC);

PRAGMA user_version = 1;
";
