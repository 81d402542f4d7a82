use crate::{scope_database_id, validate_connection_shape, RegistryEvent};
use chrono::Utc;
use cubegate_core::{ConnectionConfig, CubeFile, DatabaseConfig, DatabaseStatus, GatewayError, Result};
use cubegate_storage::{DatabaseUpdate, RegistryStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The single entry point for mutating the registered-database set. Holds
/// no reference to its subscribers; it only ever publishes to
/// [`RegistryEvent`] receivers obtained via [`RegistryManager::subscribe`].
pub struct RegistryManager {
    store: Arc<dyn RegistryStore>,
    events: broadcast::Sender<RegistryEvent>,
}

impl RegistryManager {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        RegistryManager { store, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: RegistryEvent) {
        // A lagging or absent subscriber is not a failure for the caller
        // whose write just committed.
        let _ = self.events.send(event);
    }

    /// Canonical tenant-scoped lookup. Every component that needs a
    /// database by id (policy enforcer, fs sync, MCP handlers) goes through
    /// this rather than calling the store directly, so a mismatched tenant
    /// id always surfaces as `NOT_FOUND` rather than a leak. Not to be
    /// confused with the pure [`scope_database_id`] function this id was
    /// derived from at creation time.
    #[instrument(skip(self))]
    pub fn lookup_database(
        &self,
        tenant_id: Option<&str>,
        database_id: &str,
    ) -> Result<DatabaseConfig> {
        self.store
            .get_database(tenant_id, database_id)?
            .ok_or_else(|| GatewayError::NotFound(format!("database {database_id}")))
    }

    pub fn list_databases(&self, tenant_id: Option<&str>) -> Result<Vec<DatabaseConfig>> {
        self.store.list_databases(tenant_id)
    }

    /// Resolve a tenant slug (as it appears in a path-based MCP URL) to its
    /// tenant id.
    #[instrument(skip(self))]
    pub fn resolve_tenant_slug(&self, slug: &str) -> Result<String> {
        self.store
            .get_tenant_by_slug(slug)?
            .map(|t| t.id)
            .ok_or_else(|| GatewayError::NotFound(format!("tenant {slug}")))
    }

    #[instrument(skip(self, connection))]
    pub fn create_database(
        &self,
        tenant_id: Option<&str>,
        slug: &str,
        name: &str,
        description: Option<&str>,
        connection: ConnectionConfig,
        max_limit: u64,
    ) -> Result<DatabaseConfig> {
        validate_connection_shape(&connection)?;

        if self
            .store
            .get_database_by_slug(tenant_id, slug)?
            .is_some()
        {
            return Err(GatewayError::SlugTaken(slug.to_string()));
        }

        let now = Utc::now();
        let database = DatabaseConfig {
            id: scope_database_id(slug, tenant_id),
            slug: slug.to_string(),
            tenant_id: tenant_id.map(String::from),
            name: name.to_string(),
            description: description.map(String::from),
            status: DatabaseStatus::Inactive,
            connection,
            cube_api_url: None,
            jwt_secret: Some(uuid::Uuid::new_v4().to_string()),
            max_limit,
            deny_members: Vec::new(),
            default_segments: Vec::new(),
            default_filters: Vec::new(),
            return_sql: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.create_database(&database)?;
        info!(database_id = %created.id, %slug, "database registered");
        self.publish(RegistryEvent::DatabaseCreated(created.clone()));
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub fn update_database(
        &self,
        tenant_id: Option<&str>,
        id: &str,
        update: DatabaseUpdate,
    ) -> Result<DatabaseConfig> {
        if let Some(connection) = &update.connection {
            validate_connection_shape(connection)?;
        }
        let updated = self.store.update_database(tenant_id, id, &update)?;
        self.publish(RegistryEvent::DatabaseUpdated(updated.clone()));
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn activate_database(&self, tenant_id: Option<&str>, id: &str) -> Result<DatabaseConfig> {
        let database = self.lookup_database(tenant_id, id)?;
        validate_connection_shape(&database.connection)?;
        let activated =
            self.store
                .set_database_status(tenant_id, id, DatabaseStatus::Active, None)?;
        info!(database_id = %id, "database activated");
        self.publish(RegistryEvent::DatabaseActivated(activated.clone()));
        Ok(activated)
    }

    #[instrument(skip(self))]
    pub fn deactivate_database(
        &self,
        tenant_id: Option<&str>,
        id: &str,
    ) -> Result<DatabaseConfig> {
        let deactivated =
            self.store
                .set_database_status(tenant_id, id, DatabaseStatus::Inactive, None)?;
        info!(database_id = %id, "database deactivated");
        self.publish(RegistryEvent::DatabaseDeactivated(deactivated.clone()));
        Ok(deactivated)
    }

    /// Record a connectivity failure observed outside of the normal
    /// activate/deactivate flow (e.g. a failed `/load` call against the
    /// cube engine) without otherwise changing status.
    pub fn mark_errored(&self, tenant_id: Option<&str>, id: &str, message: &str) -> Result<()> {
        let current = self.lookup_database(tenant_id, id)?;
        self.store
            .set_database_status(tenant_id, id, current.status, Some(message))?;
        warn!(database_id = %id, error = message, "database marked errored");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_database(&self, tenant_id: Option<&str>, id: &str) -> Result<()> {
        self.store.delete_database(tenant_id, id)?;
        info!(database_id = %id, "database deleted");
        self.publish(RegistryEvent::DatabaseDeleted {
            tenant_id: tenant_id.map(String::from),
            id: id.to_string(),
        });
        Ok(())
    }

    /// Structural-only connectivity check (see [`validate_connection_shape`]).
    pub fn test_connection(&self, connection: &ConnectionConfig) -> Result<()> {
        validate_connection_shape(connection)
    }

    /// Ensure a tenant-less default database exists, used on first boot of
    /// a self-hosted deployment so there is always at least one queryable
    /// database without requiring an admin setup step.
    pub fn initialize_default_database(&self, connection: ConnectionConfig) -> Result<DatabaseConfig> {
        if let Some(existing) = self.store.get_database_by_slug(None, "default")? {
            return Ok(existing);
        }
        self.create_database(
            None,
            "default",
            "Default",
            Some("Automatically created default database"),
            connection,
            10_000,
        )
    }

    /// Create or overwrite a cube file for a database, publishing
    /// [`RegistryEvent::CubeFilesChanged`] so the filesystem sync and
    /// catalog index re-derive their state.
    #[instrument(skip(self, content))]
    pub fn put_cube_file(
        &self,
        tenant_id: Option<&str>,
        database_id: &str,
        file_name: &str,
        content: String,
    ) -> Result<CubeFile> {
        self.lookup_database(tenant_id, database_id)?;
        let now = Utc::now();
        let existing = self.store.get_cube_file(database_id, file_name)?;
        let file = CubeFile {
            database_id: database_id.to_string(),
            file_name: file_name.to_string(),
            content,
            created_at: existing.map(|f| f.created_at).unwrap_or(now),
            updated_at: now,
        };
        let saved = self.store.put_cube_file(&file)?;
        info!(%database_id, %file_name, "cube file written");
        self.publish(RegistryEvent::CubeFilesChanged {
            database_id: database_id.to_string(),
        });
        Ok(saved)
    }

    pub fn get_cube_file(
        &self,
        tenant_id: Option<&str>,
        database_id: &str,
        file_name: &str,
    ) -> Result<CubeFile> {
        self.lookup_database(tenant_id, database_id)?;
        self.store
            .get_cube_file(database_id, file_name)?
            .ok_or_else(|| GatewayError::NotFound(format!("cube file {file_name}")))
    }

    pub fn list_cube_files(&self, tenant_id: Option<&str>, database_id: &str) -> Result<Vec<CubeFile>> {
        self.lookup_database(tenant_id, database_id)?;
        self.store.list_cube_files(database_id)
    }

    #[instrument(skip(self))]
    pub fn delete_cube_file(
        &self,
        tenant_id: Option<&str>,
        database_id: &str,
        file_name: &str,
    ) -> Result<()> {
        self.lookup_database(tenant_id, database_id)?;
        self.store.delete_cube_file(database_id, file_name)?;
        info!(%database_id, %file_name, "cube file deleted");
        self.publish(RegistryEvent::CubeFilesChanged {
            database_id: database_id.to_string(),
        });
        Ok(())
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }
}
