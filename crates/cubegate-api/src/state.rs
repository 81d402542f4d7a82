//! Shared application state handed to every handler and middleware.

use crate::config::GatewayConfig;
use cubegate_catalog::{CatalogIndex, CatalogRegistry};
use cubegate_core::{CatalogConfig, DatabaseConfig, GatewayError, Result};
use cubegate_cube::CubeClient;
use cubegate_registry::RegistryManager;
use cubegate_storage::RegistryStore;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<RegistryManager>,
    catalog: Arc<CatalogRegistry>,
    config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(registry: Arc<RegistryManager>, catalog: Arc<CatalogRegistry>, config: GatewayConfig) -> Self {
        AppState {
            registry,
            catalog,
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &Arc<RegistryManager> {
        &self.registry
    }

    pub fn catalog(&self) -> &Arc<CatalogRegistry> {
        &self.catalog
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        self.registry.store()
    }

    /// Fetch `/meta` from the database's cube engine, fuse it with the
    /// stored governance config, and atomically replace the catalog's
    /// cached index — the same "fetch, fuse, swap" the MCP handler relies
    /// on to serve `catalog_search`/`catalog_describe`/`query_semantic`.
    pub async fn refresh_catalog(&self, database: &DatabaseConfig) -> Result<CatalogIndex> {
        let cube_api_url = database
            .cube_api_url
            .clone()
            .ok_or_else(|| GatewayError::Validation {
                message: format!("database {} has no cube engine URL configured", database.id),
                details: None,
            })?;
        let jwt_secret = database
            .jwt_secret
            .as_deref()
            .ok_or_else(|| GatewayError::Internal("database has no signing secret".to_string()))?;

        let client = CubeClient::new(cube_api_url);
        let meta = match client.meta(&database.id, jwt_secret).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(database_id = %database.id, error = %e, "upstream meta unavailable, serving an empty catalog");
                cubegate_cube::CubeMeta { cubes: Vec::new() }
            }
        };
        let config = self
            .store()
            .get_catalog_config(&database.id)?
            .unwrap_or_else(CatalogConfig::default);

        let index = CatalogIndex::build(&meta, &config);
        self.catalog.put(&database.id, index.clone());
        Ok(index)
    }
}
