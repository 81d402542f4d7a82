use crate::{sync_connections_to_disk, sync_cube_files_to_disk};
use cubegate_core::{GatewayError, Result};
use cubegate_storage::RegistryStore;
use std::path::Path;
use tracing::instrument;

/// Rebuild the entire on-disk tree from the registry: every tenant's
/// databases (tenant-less deployments pass `None`) get their cube files
/// synced, and one combined `cube-connections.json` is written covering all of
/// them.
#[instrument(skip(store))]
pub fn sync_all_to_disk(
    store: &dyn RegistryStore,
    base_dir: &Path,
    tenant_ids: &[Option<String>],
    docker_bridge: bool,
) -> Result<()> {
    let mut all_databases = Vec::new();
    for tenant_id in tenant_ids {
        let databases = store.list_databases(tenant_id.as_deref())?;
        for database in &databases {
            let files = store.list_cube_files(&database.id)?;
            sync_cube_files_to_disk(base_dir, &database.id, &files)
                .map_err(|e| GatewayError::Internal(format!("failed to sync cube files: {e}")))?;
        }
        all_databases.extend(databases);
    }

    sync_connections_to_disk(base_dir, &all_databases, docker_bridge)
        .map_err(|e| GatewayError::Internal(format!("failed to sync connections file: {e}")))?;

    Ok(())
}
