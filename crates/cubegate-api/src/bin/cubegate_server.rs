//! CubeGate gateway server: the admin REST API and both MCP transports
//! sharing one registry, one catalog index, and one on-disk sync loop.

use cubegate_api::{admin_router, AppState, GatewayConfig};
use cubegate_catalog::CatalogRegistry;
use cubegate_mcp::{mcp_router, serve_stdio, HandlerFactory};
use cubegate_registry::RegistryManager;
use cubegate_storage::{RegistryStore, SqliteRegistryStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    let store: Arc<dyn RegistryStore> =
        match SqliteRegistryStore::open(&config.registry_db_path, &config.encryption_secret()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(error = %e, "failed to open registry database");
                std::process::exit(1);
            }
        };
    let registry = Arc::new(RegistryManager::new(store.clone()));
    let catalog = Arc::new(CatalogRegistry::new());

    if let Err(e) = sync_registry_to_disk(&store, &config) {
        tracing::warn!(error = %e, "initial filesystem sync failed");
    }
    spawn_sync_subscriber(registry.clone(), config.clone());

    let factory = HandlerFactory::new(registry.clone(), catalog.clone());
    let state = AppState::new(registry.clone(), catalog.clone(), config.clone());

    let mut router = admin_router(state);
    if config.mcp_http_enabled {
        router = router.merge(mcp_router(factory.clone()));
    }

    let mut tasks = Vec::new();

    if config.mcp_http_enabled {
        let addr = format!("{}:{}", config.mcp_http_host, config.mcp_http_port);
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(%addr, error = %e, "failed to bind HTTP listener");
                std::process::exit(1);
            }
        };
        tracing::info!(%addr, "serving admin REST API and MCP HTTP transport");
        tasks.push(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "HTTP server exited");
            }
        }));
    }

    if config.mcp_stdio_enabled {
        match resolve_stdio_handler(&factory, &store, &config) {
            Ok(handler) => {
                tracing::info!(database_id = %handler.database_id, "serving MCP stdio transport");
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = serve_stdio(handler).await {
                        tracing::error!(error = %e, "stdio transport exited");
                    }
                }));
            }
            Err(e) => {
                tracing::error!(error = %e, "MCP_STDIO_ENABLED is set but no database could be resolved for it");
            }
        }
    }

    for task in tasks {
        let _ = task.await;
    }
}

fn resolve_stdio_handler(
    factory: &HandlerFactory,
    store: &Arc<dyn RegistryStore>,
    config: &GatewayConfig,
) -> Result<cubegate_mcp::McpHandler, cubegate_core::GatewayError> {
    let database_id = match &config.stdio_database_id {
        Some(id) => id.clone(),
        None => store
            .get_database_by_slug(None, "default")?
            .ok_or_else(|| cubegate_core::GatewayError::NotFound("default database".to_string()))?
            .id,
    };
    factory.build(None, &database_id)
}

fn sync_registry_to_disk(
    store: &Arc<dyn RegistryStore>,
    config: &GatewayConfig,
) -> cubegate_core::Result<()> {
    let mut tenant_ids: Vec<Option<String>> = store
        .list_tenants()?
        .into_iter()
        .map(|t| Some(t.id))
        .collect();
    tenant_ids.push(None);
    cubegate_fs_sync::sync_all_to_disk(store.as_ref(), &config.data_dir, &tenant_ids, config.docker_bridge)
}

/// Subscribe to registry events and re-derive the on-disk tree on every
/// change, so the cube engine's next reload picks up the new state without
/// an explicit sync step from the caller.
fn spawn_sync_subscriber(registry: Arc<RegistryManager>, config: GatewayConfig) {
    let mut events = registry.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(_event) => {
                    if let Err(e) = sync_registry_to_disk(registry.store(), &config) {
                        tracing::warn!(error = %e, "filesystem sync after registry event failed");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "registry event subscriber lagged, resyncing from scratch");
                    if let Err(e) = sync_registry_to_disk(registry.store(), &config) {
                        tracing::warn!(error = %e, "filesystem sync after lag recovery failed");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
