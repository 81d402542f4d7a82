//! SQLite schema for the registry store (spec §4.1).
//!
//! Creation runs inside a `BEGIN IMMEDIATE` transaction, which takes
//! SQLite's reserved write lock for the duration of the DDL batch. Since the
//! registry is a single file shared by every process in the deployment,
//! that lock stands in for the advisory lock a Postgres-backed
//! implementation would take before running its migrations.

use rusqlite::Connection;

/// Current schema version, stored in `registry_meta`.
pub const SCHEMA_VERSION: i64 = 1;

pub fn init_sqlite_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

    tx.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS registry_meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tenants (
          id TEXT PRIMARY KEY,
          slug TEXT UNIQUE NOT NULL,
          name TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS databases (
          id TEXT PRIMARY KEY,
          slug TEXT NOT NULL,
          tenant_id TEXT REFERENCES tenants(id) ON DELETE CASCADE,
          name TEXT NOT NULL,
          description TEXT,
          status TEXT NOT NULL DEFAULT 'inactive',
          connection_json TEXT NOT NULL,
          cube_api_url TEXT,
          jwt_secret_enc TEXT,
          max_limit INTEGER NOT NULL DEFAULT 10000,
          deny_members_json TEXT NOT NULL DEFAULT '[]',
          default_segments_json TEXT NOT NULL DEFAULT '[]',
          default_filters_json TEXT NOT NULL DEFAULT '[]',
          return_sql INTEGER NOT NULL DEFAULT 0,
          last_error TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          UNIQUE (tenant_id, slug)
        );

        CREATE INDEX IF NOT EXISTS idx_databases_tenant ON databases(tenant_id);
        CREATE INDEX IF NOT EXISTS idx_databases_status ON databases(status);

        CREATE TABLE IF NOT EXISTS cube_files (
          database_id TEXT NOT NULL REFERENCES databases(id) ON DELETE CASCADE,
          file_name TEXT NOT NULL,
          content TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          PRIMARY KEY (database_id, file_name)
        );

        CREATE TABLE IF NOT EXISTS catalog_configs (
          database_id TEXT PRIMARY KEY REFERENCES databases(id) ON DELETE CASCADE,
          config_json TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS api_keys (
          id TEXT PRIMARY KEY,
          tenant_id TEXT REFERENCES tenants(id) ON DELETE CASCADE,
          name TEXT NOT NULL,
          key_hash TEXT UNIQUE NOT NULL,
          key_prefix TEXT NOT NULL,
          created_by TEXT,
          created_at TEXT NOT NULL,
          last_used_at TEXT,
          expires_at TEXT,
          revoked_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_api_keys_tenant ON api_keys(tenant_id);

        INSERT OR IGNORE INTO registry_meta (key, value) VALUES ('schema_version', '1');
        "#,
    )?;

    tx.commit()
}

/// Reads `registry_meta.schema_version`, used by callers that want to
/// confirm a pre-existing database file matches what this binary expects.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT value FROM registry_meta WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .map(|v| v.parse().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_all_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_sqlite_schema(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for expected in [
            "tenants",
            "databases",
            "cube_files",
            "catalog_configs",
            "api_keys",
            "registry_meta",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }

    #[test]
    fn is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_sqlite_schema(&mut conn).unwrap();
        init_sqlite_schema(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
