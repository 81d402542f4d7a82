//! CubeGate Storage
//!
//! Tenant-scoped persistence for the registry: tenants, databases, cube
//! files, catalog configs, and API keys, backed by SQLite behind the
//! [`RegistryStore`] trait so a future deployment can swap in another
//! engine without touching call sites.

mod encryption;
mod sqlite_store;

pub use encryption::{generate_salt, Encryptor};
pub use sqlite_store::SqliteRegistryStore;

use cubegate_core::{ApiKey, CatalogConfig, CubeFile, DatabaseConfig, Result, Tenant};

/// A database update. Every field is optional; `None` leaves the column
/// untouched. `status` is intentionally absent — status only changes
/// through `activate`/`deactivate`, never through a general update (spec
/// invariant: status is never implicitly demoted).
#[derive(Debug, Clone, Default)]
pub struct DatabaseUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub connection: Option<cubegate_core::ConnectionConfig>,
    pub cube_api_url: Option<Option<String>>,
    pub jwt_secret: Option<Option<String>>,
    pub max_limit: Option<u64>,
    pub deny_members: Option<Vec<String>>,
    pub default_segments: Option<Vec<String>>,
    pub default_filters: Option<Vec<cubegate_core::QueryFilter>>,
    pub return_sql: Option<bool>,
}

/// Storage contract for the registry (spec §4.1). All lookups that take a
/// `tenant_id` scope the query to that tenant (or to tenant-less rows, when
/// `None`) — a caller can never fetch a row belonging to a different tenant
/// by guessing its id.
pub trait RegistryStore: Send + Sync {
    // --- Tenants ---
    fn create_tenant(&self, slug: &str, name: Option<&str>) -> Result<Tenant>;
    fn get_tenant(&self, id: &str) -> Result<Option<Tenant>>;
    fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>>;
    fn list_tenants(&self) -> Result<Vec<Tenant>>;
    /// Rename a tenant's slug. Callers are expected to precheck uniqueness;
    /// this still surfaces `SlugTaken` on a last-moment collision rather
    /// than corrupting the unique index.
    fn update_tenant_slug(&self, tenant_id: &str, new_slug: &str) -> Result<Tenant>;

    // --- Databases ---
    fn create_database(&self, database: &DatabaseConfig) -> Result<DatabaseConfig>;
    fn get_database(&self, tenant_id: Option<&str>, id: &str) -> Result<Option<DatabaseConfig>>;
    fn get_database_by_slug(
        &self,
        tenant_id: Option<&str>,
        slug: &str,
    ) -> Result<Option<DatabaseConfig>>;
    fn list_databases(&self, tenant_id: Option<&str>) -> Result<Vec<DatabaseConfig>>;
    fn update_database(
        &self,
        tenant_id: Option<&str>,
        id: &str,
        update: &DatabaseUpdate,
    ) -> Result<DatabaseConfig>;
    fn set_database_status(
        &self,
        tenant_id: Option<&str>,
        id: &str,
        status: cubegate_core::DatabaseStatus,
        last_error: Option<&str>,
    ) -> Result<DatabaseConfig>;
    fn delete_database(&self, tenant_id: Option<&str>, id: &str) -> Result<()>;

    // --- Cube files ---
    fn put_cube_file(&self, file: &CubeFile) -> Result<CubeFile>;
    fn get_cube_file(&self, database_id: &str, file_name: &str) -> Result<Option<CubeFile>>;
    fn list_cube_files(&self, database_id: &str) -> Result<Vec<CubeFile>>;
    fn delete_cube_file(&self, database_id: &str, file_name: &str) -> Result<()>;

    // --- Catalog config ---
    fn get_catalog_config(&self, database_id: &str) -> Result<Option<CatalogConfig>>;
    fn put_catalog_config(&self, database_id: &str, config: &CatalogConfig) -> Result<()>;

    // --- API keys ---
    fn create_api_key(&self, key: &ApiKey) -> Result<ApiKey>;
    fn get_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>>;
    fn list_api_keys(&self, tenant_id: Option<&str>) -> Result<Vec<ApiKey>>;
    fn revoke_api_key(&self, tenant_id: Option<&str>, id: &str) -> Result<()>;
    fn touch_api_key_last_used(&self, id: &str) -> Result<()>;

    // --- Deployment settings ---
    /// The deployment-wide salt used to derive the encryption key, created
    /// once on first boot and reused thereafter.
    fn encryption_salt(&self) -> Result<Vec<u8>>;
}
