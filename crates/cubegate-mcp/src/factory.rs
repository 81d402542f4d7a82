use crate::handler::McpHandler;
use cubegate_catalog::CatalogRegistry;
use cubegate_core::GatewayError;
use cubegate_cube::CubeClient;
use cubegate_registry::RegistryManager;
use std::sync::Arc;

/// Builds an [`McpHandler`] for a database on demand — at `initialize` for
/// the HTTP transport, or once at startup for the stdio transport.
#[derive(Clone)]
pub struct HandlerFactory {
    registry: Arc<RegistryManager>,
    catalog: Arc<CatalogRegistry>,
}

impl HandlerFactory {
    pub fn new(registry: Arc<RegistryManager>, catalog: Arc<CatalogRegistry>) -> Self {
        HandlerFactory { registry, catalog }
    }

    /// Resolve a tenant slug from a path-based MCP URL to its tenant id.
    pub fn resolve_tenant_slug(&self, slug: &str) -> Result<String, GatewayError> {
        self.registry.resolve_tenant_slug(slug)
    }

    pub fn build(
        &self,
        tenant_id: Option<&str>,
        database_id: &str,
    ) -> Result<McpHandler, GatewayError> {
        let database = self.registry.lookup_database(tenant_id, database_id)?;
        let cube_api_url = database.cube_api_url.clone().ok_or_else(|| {
            GatewayError::Validation {
                message: format!("database {database_id} has no cube engine URL configured"),
                details: None,
            }
        })?;

        Ok(McpHandler::new(
            database_id.to_string(),
            tenant_id.map(String::from),
            self.registry.clone(),
            self.catalog.clone(),
            CubeClient::new(cube_api_url),
        ))
    }
}
