use cubegate_core::DatabaseConfig;

/// A database lifecycle event, published after the corresponding store
/// mutation commits. Subscribers (filesystem sync, catalog index) treat
/// these as "go re-derive your state", not as a transactional log.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    DatabaseCreated(DatabaseConfig),
    DatabaseUpdated(DatabaseConfig),
    DatabaseActivated(DatabaseConfig),
    DatabaseDeactivated(DatabaseConfig),
    DatabaseDeleted { tenant_id: Option<String>, id: String },
    CubeFilesChanged { database_id: String },
}
