//! Shared data model (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An isolation unit. Every persisted row is either attached to a tenant or
/// explicitly tenant-less (self-hosted deployments leave every `tenant_id`
/// unset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    pub id: String,
    pub slug: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a registered database.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Inactive,
    Active,
    Error,
    Initializing,
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseStatus::Inactive => "inactive",
            DatabaseStatus::Active => "active",
            DatabaseStatus::Error => "error",
            DatabaseStatus::Initializing => "initializing",
        }
    }
}

impl std::str::FromStr for DatabaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(DatabaseStatus::Inactive),
            "active" => Ok(DatabaseStatus::Active),
            "error" => Ok(DatabaseStatus::Error),
            "initializing" => Ok(DatabaseStatus::Initializing),
            other => Err(format!("unknown database status: {other}")),
        }
    }
}

impl std::fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged union over the data warehouses the cube engine can connect to.
/// Each variant required-fields set is validated structurally by
/// `cubegate-registry`'s `test_connection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    Postgres {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: Option<String>,
        ssl: Option<bool>,
    },
    Mysql {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: Option<String>,
    },
    Redshift {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: Option<String>,
    },
    Clickhouse {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: Option<String>,
    },
    Bigquery {
        project_id: String,
        dataset: String,
        key_file: Option<String>,
    },
    Snowflake {
        account: String,
        warehouse: String,
        database: String,
        user: String,
        password: Option<String>,
    },
}

impl ConnectionConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConnectionConfig::Postgres { .. } => "postgres",
            ConnectionConfig::Mysql { .. } => "mysql",
            ConnectionConfig::Redshift { .. } => "redshift",
            ConnectionConfig::Clickhouse { .. } => "clickhouse",
            ConnectionConfig::Bigquery { .. } => "bigquery",
            ConnectionConfig::Snowflake { .. } => "snowflake",
        }
    }

    /// Replace any password-bearing field with the fixed-length mask, for
    /// inclusion in API responses and logs. BigQuery's `key_file` is treated
    /// the same way as a password.
    pub fn redacted(&self) -> ConnectionConfig {
        let mut copy = self.clone();
        match &mut copy {
            ConnectionConfig::Postgres { password, .. }
            | ConnectionConfig::Mysql { password, .. }
            | ConnectionConfig::Redshift { password, .. }
            | ConnectionConfig::Clickhouse { password, .. }
            | ConnectionConfig::Snowflake { password, .. } => {
                if password.is_some() {
                    *password = Some("********".to_string());
                }
            }
            ConnectionConfig::Bigquery { key_file, .. } => {
                if key_file.is_some() {
                    *key_file = Some("********".to_string());
                }
            }
        }
        copy
    }
}

/// A registered physical database, scoped to a tenant (or tenant-less for
/// self-hosted deployments).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub id: String,
    pub slug: String,
    pub tenant_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: DatabaseStatus,
    pub connection: ConnectionConfig,
    pub cube_api_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub max_limit: u64,
    pub deny_members: Vec<String>,
    pub default_segments: Vec<String>,
    pub default_filters: Vec<QueryFilter>,
    pub return_sql: bool,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatabaseConfig {
    /// Return a copy with `connection.password`/`jwt_secret` masked, safe to
    /// serialize into an API response or log line (spec invariant: raw
    /// secrets never appear in a response body or log line).
    pub fn redacted(&self) -> DatabaseConfig {
        let mut copy = self.clone();
        copy.connection = copy.connection.redacted();
        if copy.jwt_secret.is_some() {
            copy.jwt_secret = Some("********".to_string());
        }
        copy
    }
}

/// Logical YAML describing one cube (measures, dimensions, segments,
/// pre-aggregations). Content is opaque to the gateway; it is merely
/// persisted and materialized to disk for the cube engine to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeFile {
    pub database_id: String,
    pub file_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-member governance override inside a `CatalogConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pii: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_group_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied_group_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_time_dimension: Option<bool>,
}

/// Deployment-wide default exposure/pii posture, applied when a member has
/// no explicit override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pii: Option<bool>,
}

/// A default filter injected by the policy enforcer unless the caller
/// already specified one for the same member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryFilter {
    pub member: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Per-database governance document, fused with upstream cube-engine
/// metadata to build the `CatalogIndex`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_version")]
    pub version: u32,
    #[serde(default)]
    pub defaults: CatalogDefaults,
    #[serde(default)]
    pub members: HashMap<String, MemberOverride>,
    #[serde(default)]
    pub default_segments: Vec<String>,
    #[serde(default)]
    pub default_filters: Vec<QueryFilter>,
}

fn default_catalog_version() -> u32 {
    1
}

/// The kind of a cube member, as reclassified by the catalog index (a
/// cube-engine dimension of type `time` becomes `TimeDimension` here).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MemberType {
    Measure,
    Dimension,
    Segment,
    TimeDimension,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Measure => "measure",
            MemberType::Dimension => "dimension",
            MemberType::Segment => "segment",
            MemberType::TimeDimension => "timeDimension",
        }
    }
}

/// A fully fused member: upstream cube-engine metadata plus governance
/// attributes from the `CatalogConfig`. Derived in-memory; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedMember {
    pub name: String,
    #[serde(rename = "type")]
    pub member_type: MemberType,
    pub cube_name: String,
    pub title: String,
    pub short_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drill_members: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub granularities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub is_visible: bool,
    pub public: bool,
    pub exposed: bool,
    pub pii: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_group_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied_group_by: Option<Vec<String>>,
    pub requires_time_dimension: bool,
}

/// A per-tenant API key. The raw key is returned exactly once, at creation;
/// all later lookups go by the SHA-256 hash of the presented value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub tenant_id: Option<String>,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }
}

/// Freshly generated API key returned exactly once at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApiKey {
    pub id: String,
    pub name: String,
    pub raw_key: String,
    pub key_prefix: String,
    pub created_at: DateTime<Utc>,
}
