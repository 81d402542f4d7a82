use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PublicConfig {
    pub auth_enabled: bool,
    pub mcp_stdio_enabled: bool,
    pub mcp_http_enabled: bool,
}

pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    let config = state.config();
    Json(PublicConfig {
        auth_enabled: config.auth_enabled,
        mcp_stdio_enabled: config.mcp_stdio_enabled,
        mcp_http_enabled: config.mcp_http_enabled,
    })
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct Version {
    pub version: &'static str,
}

pub async fn version() -> Json<Version> {
    Json(Version {
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use cubegate_catalog::CatalogRegistry;
    use cubegate_registry::RegistryManager;
    use cubegate_storage::SqliteRegistryStore;
    use std::sync::Arc;

    fn state(config: GatewayConfig) -> AppState {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        AppState::new(
            Arc::new(RegistryManager::new(Arc::new(store))),
            Arc::new(CatalogRegistry::new()),
            config,
        )
    }

    #[tokio::test]
    async fn health_reports_ok() {
        assert_eq!(health().await.0.status, "ok");
    }

    #[tokio::test]
    async fn version_matches_the_crate_version() {
        assert_eq!(version().await.0.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn public_config_mirrors_transport_flags() {
        let config = GatewayConfig {
            auth_enabled: true,
            mcp_stdio_enabled: false,
            mcp_http_enabled: true,
            ..GatewayConfig::default()
        };
        let result = public_config(State(state(config))).await;
        assert!(result.0.auth_enabled);
        assert!(!result.0.mcp_stdio_enabled);
        assert!(result.0.mcp_http_enabled);
    }
}
