//! CubeGate Core
//!
//! Shared data model, error taxonomy, the semantic query wire contract, and
//! the registry's SQLite schema. Every other CubeGate crate depends on this
//! one and never reaches past it into `rusqlite`/`serde_json` directly for
//! these concerns.

mod error;
mod query;
mod schema;
mod types;

pub use error::{GatewayError, Result, ToolError};
pub use query::{CubeQuery, TimeDimensionInput, ALLOWED_TOP_LEVEL_KEYS};
pub use schema::{init_sqlite_schema, schema_version, SCHEMA_VERSION};
pub use types::{
    ApiKey, CatalogConfig, CatalogDefaults, ConnectionConfig, CreatedApiKey, CubeFile,
    DatabaseConfig, DatabaseStatus, IndexedMember, MemberOverride, MemberType, QueryFilter,
    Tenant,
};
