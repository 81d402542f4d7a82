use crate::{DatabaseUpdate, Encryptor, RegistryStore};
use chrono::Utc;
use cubegate_core::{
    init_sqlite_schema, ApiKey, CatalogConfig, ConnectionConfig, CubeFile, DatabaseConfig,
    DatabaseStatus, GatewayError, QueryFilter, Result, Tenant,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed [`RegistryStore`]. A single connection is held behind a
/// mutex — SQLite serializes writers at the file level regardless, and the
/// registry's write volume (admin operations, not query traffic) never
/// makes that a bottleneck.
pub struct SqliteRegistryStore {
    conn: Mutex<Connection>,
    encryptor: Encryptor,
}

impl SqliteRegistryStore {
    pub fn open<P: AsRef<Path>>(path: P, master_secret: &[u8]) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_sqlite_schema(&mut conn)?;
        let salt = load_or_create_salt(&conn)?;
        let encryptor = Encryptor::new(master_secret, &salt);
        Ok(SqliteRegistryStore {
            conn: Mutex::new(conn),
            encryptor,
        })
    }

    pub fn open_in_memory(master_secret: &[u8]) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_sqlite_schema(&mut conn)?;
        let salt = load_or_create_salt(&conn)?;
        let encryptor = Encryptor::new(master_secret, &salt);
        Ok(SqliteRegistryStore {
            conn: Mutex::new(conn),
            encryptor,
        })
    }

    fn row_to_database(&self, row: &rusqlite::Row) -> rusqlite::Result<DatabaseConfig> {
        let connection_enc: String = row.get("connection_json")?;
        let connection_json = self.encryptor.decrypt_or_plaintext(&connection_enc);
        let connection: ConnectionConfig = serde_json::from_str(&connection_json)
            .unwrap_or_else(|_| ConnectionConfig::Postgres {
                host: String::new(),
                port: 5432,
                database: String::new(),
                user: String::new(),
                password: None,
                ssl: None,
            });

        let jwt_secret_enc: Option<String> = row.get("jwt_secret_enc")?;
        let jwt_secret = jwt_secret_enc.map(|v| self.encryptor.decrypt_or_plaintext(&v));

        let status_str: String = row.get("status")?;
        let deny_members_json: String = row.get("deny_members_json")?;
        let default_segments_json: String = row.get("default_segments_json")?;
        let default_filters_json: String = row.get("default_filters_json")?;

        Ok(DatabaseConfig {
            id: row.get("id")?,
            slug: row.get("slug")?,
            tenant_id: row.get("tenant_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            status: status_str.parse().unwrap_or(DatabaseStatus::Inactive),
            connection,
            cube_api_url: row.get("cube_api_url")?,
            jwt_secret,
            max_limit: row.get::<_, i64>("max_limit")? as u64,
            deny_members: serde_json::from_str(&deny_members_json).unwrap_or_default(),
            default_segments: serde_json::from_str(&default_segments_json).unwrap_or_default(),
            default_filters: serde_json::from_str(&default_filters_json).unwrap_or_default(),
            return_sql: row.get::<_, i64>("return_sql")? != 0,
            last_error: row.get("last_error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn fetch_database(
        &self,
        conn: &Connection,
        tenant_id: Option<&str>,
        id: &str,
    ) -> Result<Option<DatabaseConfig>> {
        let sql = "SELECT * FROM databases WHERE id = ?1 AND tenant_id IS ?2";
        let result = conn
            .query_row(sql, params![id, tenant_id], |row| self.row_to_database(row))
            .optional()?;
        Ok(result)
    }
}

fn load_or_create_salt(conn: &Connection) -> Result<Vec<u8>> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM registry_meta WHERE key = 'encryption_salt'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(hex_salt) = existing {
        return hex::decode(&hex_salt)
            .map_err(|e| GatewayError::Internal(format!("corrupt encryption salt: {e}")));
    }

    let salt = crate::encryption::generate_salt();
    conn.execute(
        "INSERT INTO registry_meta (key, value) VALUES ('encryption_salt', ?1)",
        params![hex::encode(&salt)],
    )?;
    Ok(salt)
}

impl RegistryStore for SqliteRegistryStore {
    fn create_tenant(&self, slug: &str, name: Option<&str>) -> Result<Tenant> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let result = conn.execute(
            "INSERT INTO tenants (id, slug, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, slug, name, now, now],
        );
        match result {
            Ok(_) => Ok(Tenant {
                id,
                slug: slug.to_string(),
                name: name.map(String::from),
                created_at: now,
                updated_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Race: another request created the same slug between our
                // check and this insert. Recover by returning the row that
                // won instead of surfacing a spurious failure.
                conn.query_row(
                    "SELECT id, slug, name, created_at, updated_at FROM tenants WHERE slug = ?1",
                    params![slug],
                    |row| {
                        Ok(Tenant {
                            id: row.get(0)?,
                            slug: row.get(1)?,
                            name: row.get(2)?,
                            created_at: row.get(3)?,
                            updated_at: row.get(4)?,
                        })
                    },
                )
                .map_err(|_| GatewayError::SlugTaken(slug.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_tenant(&self, id: &str) -> Result<Option<Tenant>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, slug, name, created_at, updated_at FROM tenants WHERE id = ?1",
            params![id],
            |row| {
                Ok(Tenant {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(GatewayError::from)
    }

    fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, slug, name, created_at, updated_at FROM tenants WHERE slug = ?1",
            params![slug],
            |row| {
                Ok(Tenant {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(GatewayError::from)
    }

    fn update_tenant_slug(&self, tenant_id: &str, new_slug: &str) -> Result<Tenant> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let rows = conn
            .execute(
                "UPDATE tenants SET slug = ?1, updated_at = ?2 WHERE id = ?3",
                params![new_slug, now, tenant_id],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(code, _)
                    if code.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    GatewayError::SlugTaken(new_slug.to_string())
                }
                other => other.into(),
            })?;

        if rows == 0 {
            return Err(GatewayError::NotFound(format!("tenant {tenant_id}")));
        }

        conn.query_row(
            "SELECT id, slug, name, created_at, updated_at FROM tenants WHERE id = ?1",
            params![tenant_id],
            |row| {
                Ok(Tenant {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .map_err(GatewayError::from)
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, slug, name, created_at, updated_at FROM tenants ORDER BY created_at")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Tenant {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn create_database(&self, database: &DatabaseConfig) -> Result<DatabaseConfig> {
        let conn = self.conn.lock().unwrap();
        let connection_json = serde_json::to_string(&database.connection)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize connection: {e}")))?;
        let connection_enc = self.encryptor.encrypt(&connection_json)?;
        let jwt_secret_enc = database
            .jwt_secret
            .as_deref()
            .map(|s| self.encryptor.encrypt(s))
            .transpose()?;

        let result = conn.execute(
            "INSERT INTO databases (
                id, slug, tenant_id, name, description, status, connection_json,
                cube_api_url, jwt_secret_enc, max_limit, deny_members_json,
                default_segments_json, default_filters_json, return_sql,
                last_error, created_at, updated_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
            params![
                database.id,
                database.slug,
                database.tenant_id,
                database.name,
                database.description,
                database.status.as_str(),
                connection_enc,
                database.cube_api_url,
                jwt_secret_enc,
                database.max_limit as i64,
                serde_json::to_string(&database.deny_members).unwrap(),
                serde_json::to_string(&database.default_segments).unwrap(),
                serde_json::to_string(&database.default_filters).unwrap(),
                database.return_sql as i64,
                database.last_error,
                database.created_at,
                database.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(database.clone()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(GatewayError::DuplicateId(database.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_database(&self, tenant_id: Option<&str>, id: &str) -> Result<Option<DatabaseConfig>> {
        let conn = self.conn.lock().unwrap();
        self.fetch_database(&conn, tenant_id, id)
    }

    fn get_database_by_slug(
        &self,
        tenant_id: Option<&str>,
        slug: &str,
    ) -> Result<Option<DatabaseConfig>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM databases WHERE slug = ?1 AND tenant_id IS ?2",
            params![slug, tenant_id],
            |row| self.row_to_database(row),
        )
        .optional()
        .map_err(GatewayError::from)
    }

    fn list_databases(&self, tenant_id: Option<&str>) -> Result<Vec<DatabaseConfig>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM databases WHERE tenant_id IS ?1 ORDER BY created_at")?;
        let rows = stmt
            .query_map(params![tenant_id], |row| self.row_to_database(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn update_database(
        &self,
        tenant_id: Option<&str>,
        id: &str,
        update: &DatabaseUpdate,
    ) -> Result<DatabaseConfig> {
        let conn = self.conn.lock().unwrap();
        let mut current = self
            .fetch_database(&conn, tenant_id, id)?
            .ok_or_else(|| GatewayError::NotFound(format!("database {id}")))?;

        if let Some(connection) = &update.connection {
            if current.status == DatabaseStatus::Active {
                return Err(GatewayError::ActiveCannotMutateConnection(id.to_string()));
            }
            current.connection = connection.clone();
        }
        if let Some(name) = &update.name {
            current.name = name.clone();
        }
        if let Some(description) = &update.description {
            current.description = description.clone();
        }
        if let Some(url) = &update.cube_api_url {
            current.cube_api_url = url.clone();
        }
        if let Some(secret) = &update.jwt_secret {
            current.jwt_secret = secret.clone();
        }
        if let Some(max_limit) = update.max_limit {
            current.max_limit = max_limit;
        }
        if let Some(deny) = &update.deny_members {
            current.deny_members = deny.clone();
        }
        if let Some(segments) = &update.default_segments {
            current.default_segments = segments.clone();
        }
        if let Some(filters) = &update.default_filters {
            current.default_filters = filters.clone();
        }
        if let Some(return_sql) = update.return_sql {
            current.return_sql = return_sql;
        }
        current.updated_at = Utc::now();

        let connection_json = serde_json::to_string(&current.connection).unwrap();
        let connection_enc = self.encryptor.encrypt(&connection_json)?;
        let jwt_secret_enc = current
            .jwt_secret
            .as_deref()
            .map(|s| self.encryptor.encrypt(s))
            .transpose()?;

        conn.execute(
            "UPDATE databases SET
                name = ?1, description = ?2, connection_json = ?3, cube_api_url = ?4,
                jwt_secret_enc = ?5, max_limit = ?6, deny_members_json = ?7,
                default_segments_json = ?8, default_filters_json = ?9, return_sql = ?10,
                updated_at = ?11
             WHERE id = ?12 AND tenant_id IS ?13",
            params![
                current.name,
                current.description,
                connection_enc,
                current.cube_api_url,
                jwt_secret_enc,
                current.max_limit as i64,
                serde_json::to_string(&current.deny_members).unwrap(),
                serde_json::to_string(&current.default_segments).unwrap(),
                serde_json::to_string(&current.default_filters).unwrap(),
                current.return_sql as i64,
                current.updated_at,
                id,
                tenant_id,
            ],
        )?;

        Ok(current)
    }

    fn set_database_status(
        &self,
        tenant_id: Option<&str>,
        id: &str,
        status: DatabaseStatus,
        last_error: Option<&str>,
    ) -> Result<DatabaseConfig> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let updated = conn.execute(
            "UPDATE databases SET status = ?1, last_error = ?2, updated_at = ?3
             WHERE id = ?4 AND tenant_id IS ?5",
            params![status.as_str(), last_error, now, id, tenant_id],
        )?;
        if updated == 0 {
            return Err(GatewayError::NotFound(format!("database {id}")));
        }
        self.fetch_database(&conn, tenant_id, id)?
            .ok_or_else(|| GatewayError::NotFound(format!("database {id}")))
    }

    fn delete_database(&self, tenant_id: Option<&str>, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let existing = self
            .fetch_database(&conn, tenant_id, id)?
            .ok_or_else(|| GatewayError::NotFound(format!("database {id}")))?;
        if existing.status == DatabaseStatus::Active {
            return Err(GatewayError::ActiveCannotDelete(id.to_string()));
        }
        conn.execute(
            "DELETE FROM databases WHERE id = ?1 AND tenant_id IS ?2",
            params![id, tenant_id],
        )?;
        Ok(())
    }

    fn put_cube_file(&self, file: &CubeFile) -> Result<CubeFile> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cube_files (database_id, file_name, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(database_id, file_name) DO UPDATE SET
                content = excluded.content, updated_at = excluded.updated_at",
            params![
                file.database_id,
                file.file_name,
                file.content,
                file.created_at,
                file.updated_at,
            ],
        )?;
        Ok(file.clone())
    }

    fn get_cube_file(&self, database_id: &str, file_name: &str) -> Result<Option<CubeFile>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT database_id, file_name, content, created_at, updated_at
             FROM cube_files WHERE database_id = ?1 AND file_name = ?2",
            params![database_id, file_name],
            |row| {
                Ok(CubeFile {
                    database_id: row.get(0)?,
                    file_name: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .optional()
        .map_err(GatewayError::from)
    }

    fn list_cube_files(&self, database_id: &str) -> Result<Vec<CubeFile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT database_id, file_name, content, created_at, updated_at
             FROM cube_files WHERE database_id = ?1 ORDER BY file_name",
        )?;
        let rows = stmt
            .query_map(params![database_id], |row| {
                Ok(CubeFile {
                    database_id: row.get(0)?,
                    file_name: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_cube_file(&self, database_id: &str, file_name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM cube_files WHERE database_id = ?1 AND file_name = ?2",
            params![database_id, file_name],
        )?;
        Ok(())
    }

    fn get_catalog_config(&self, database_id: &str) -> Result<Option<CatalogConfig>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT config_json FROM catalog_configs WHERE database_id = ?1",
                params![database_id],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| GatewayError::Internal(format!("corrupt catalog config: {e}")))
        })
        .transpose()
    }

    fn put_catalog_config(&self, database_id: &str, config: &CatalogConfig) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let json = serde_json::to_string(config)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize config: {e}")))?;
        conn.execute(
            "INSERT INTO catalog_configs (database_id, config_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(database_id) DO UPDATE SET
                config_json = excluded.config_json, updated_at = excluded.updated_at",
            params![database_id, json, Utc::now()],
        )?;
        Ok(())
    }

    fn create_api_key(&self, key: &ApiKey) -> Result<ApiKey> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO api_keys (
                id, tenant_id, name, key_hash, key_prefix, created_by,
                created_at, last_used_at, expires_at, revoked_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                key.id,
                key.tenant_id,
                key.name,
                key.key_hash,
                key.key_prefix,
                key.created_by,
                key.created_at,
                key.last_used_at,
                key.expires_at,
                key.revoked_at,
            ],
        )?;
        Ok(key.clone())
    }

    fn get_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, tenant_id, name, key_hash, key_prefix, created_by,
                    created_at, last_used_at, expires_at, revoked_at
             FROM api_keys WHERE key_hash = ?1",
            params![key_hash],
            row_to_api_key,
        )
        .optional()
        .map_err(GatewayError::from)
    }

    fn list_api_keys(&self, tenant_id: Option<&str>) -> Result<Vec<ApiKey>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, tenant_id, name, key_hash, key_prefix, created_by,
                    created_at, last_used_at, expires_at, revoked_at
             FROM api_keys WHERE tenant_id IS ?1 ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map(params![tenant_id], row_to_api_key)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn revoke_api_key(&self, tenant_id: Option<&str>, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE api_keys SET revoked_at = ?1 WHERE id = ?2 AND tenant_id IS ?3",
            params![Utc::now(), id, tenant_id],
        )?;
        if updated == 0 {
            return Err(GatewayError::NotFound(format!("api key {id}")));
        }
        Ok(())
    }

    fn touch_api_key_last_used(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE api_keys SET last_used_at = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )?;
        Ok(())
    }

    fn encryption_salt(&self) -> Result<Vec<u8>> {
        let conn = self.conn.lock().unwrap();
        load_or_create_salt(&conn)
    }
}

fn row_to_api_key(row: &rusqlite::Row) -> rusqlite::Result<ApiKey> {
    Ok(ApiKey {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        key_hash: row.get(3)?,
        key_prefix: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        last_used_at: row.get(7)?,
        expires_at: row.get(8)?,
        revoked_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubegate_core::DatabaseStatus;

    fn sample_database(id: &str) -> DatabaseConfig {
        let now = Utc::now();
        DatabaseConfig {
            id: id.to_string(),
            slug: format!("db-{id}"),
            tenant_id: None,
            name: "Sample".to_string(),
            description: None,
            status: DatabaseStatus::Inactive,
            connection: ConnectionConfig::Postgres {
                host: "localhost".to_string(),
                port: 5432,
                database: "sample".to_string(),
                user: "sample".to_string(),
                password: Some("hunter2".to_string()),
                ssl: Some(false),
            },
            cube_api_url: None,
            jwt_secret: Some("super-secret".to_string()),
            max_limit: 10_000,
            deny_members: vec![],
            default_segments: vec![],
            default_filters: vec![],
            return_sql: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn round_trips_a_database_with_encrypted_secrets() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let db = sample_database("db-1");
        store.create_database(&db).unwrap();

        let fetched = store.get_database(None, "db-1").unwrap().unwrap();
        assert_eq!(fetched.name, "Sample");
        assert_eq!(fetched.jwt_secret.as_deref(), Some("super-secret"));
        match fetched.connection {
            ConnectionConfig::Postgres { password, .. } => {
                assert_eq!(password.as_deref(), Some("hunter2"));
            }
            _ => panic!("wrong connection variant"),
        }

        // Secrets are not stored in cleartext underneath.
        let conn = store.conn.lock().unwrap();
        let raw: String = conn
            .query_row(
                "SELECT connection_json FROM databases WHERE id = 'db-1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!raw.contains("hunter2"));
    }

    #[test]
    fn active_database_connection_cannot_be_mutated() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let db = sample_database("db-2");
        store.create_database(&db).unwrap();
        store
            .set_database_status(None, "db-2", DatabaseStatus::Active, None)
            .unwrap();

        let update = DatabaseUpdate {
            connection: Some(db.connection.clone()),
            ..Default::default()
        };
        let err = store.update_database(None, "db-2", &update).unwrap_err();
        assert_eq!(err.code(), "ACTIVE_CANNOT_MUTATE_CONNECTION");
    }

    #[test]
    fn active_database_cannot_be_deleted() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let db = sample_database("db-3");
        store.create_database(&db).unwrap();
        store
            .set_database_status(None, "db-3", DatabaseStatus::Active, None)
            .unwrap();

        let err = store.delete_database(None, "db-3").unwrap_err();
        assert_eq!(err.code(), "ACTIVE_CANNOT_DELETE");
    }

    #[test]
    fn tenant_scoping_hides_other_tenants_rows() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let tenant = store.create_tenant("acme", Some("Acme Inc")).unwrap();
        let mut db = sample_database("db-4");
        db.tenant_id = Some(tenant.id.clone());
        store.create_database(&db).unwrap();

        assert!(store.get_database(None, "db-4").unwrap().is_none());
        assert!(store
            .get_database(Some(&tenant.id), "db-4")
            .unwrap()
            .is_some());
    }

    #[test]
    fn duplicate_tenant_slug_recovers_the_winning_row() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let first = store.create_tenant("acme", None).unwrap();
        let second = store.create_tenant("acme", None).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn renames_a_tenant_slug() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let tenant = store.create_tenant("acme", None).unwrap();
        let renamed = store.update_tenant_slug(&tenant.id, "acme-corp").unwrap();
        assert_eq!(renamed.slug, "acme-corp");
        assert_eq!(
            store.get_tenant_by_slug("acme-corp").unwrap().unwrap().id,
            tenant.id
        );
    }

    #[test]
    fn rename_collides_with_an_existing_slug() {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let tenant = store.create_tenant("acme", None).unwrap();
        store.create_tenant("globex", None).unwrap();
        let err = store.update_tenant_slug(&tenant.id, "globex").unwrap_err();
        assert_eq!(err.code(), "SLUG_TAKEN");
    }
}
