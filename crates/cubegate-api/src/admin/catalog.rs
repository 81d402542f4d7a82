use crate::auth::ResolvedTenant;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::Json;
use cubegate_core::CatalogConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DatabaseScope {
    pub database: String,
}

fn tenant_id(tenant: &Option<ResolvedTenant>) -> Option<&str> {
    tenant.as_ref().map(ResolvedTenant::tenant_id)
}

pub async fn get_config(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
) -> Result<Json<CatalogConfig>, ApiError> {
    state.registry().lookup_database(tenant_id(&tenant), &scope.database)?;
    let config = state
        .store()
        .get_catalog_config(&scope.database)?
        .unwrap_or_default();
    Ok(Json(config))
}

/// Writing a new catalog config immediately refreshes the cached index so
/// the next `catalog_search`/`catalog_describe`/`query_semantic` call sees
/// it, rather than waiting for the next activation or upstream poll.
pub async fn put_config(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Json(config): Json<CatalogConfig>,
) -> Result<Json<CatalogConfig>, ApiError> {
    let database = state
        .registry()
        .lookup_database(tenant_id(&tenant), &scope.database)?;
    state.store().put_catalog_config(&scope.database, &config)?;
    if let Err(e) = state.refresh_catalog(&database).await {
        tracing::warn!(database_id = %scope.database, error = %e, "catalog refresh after config update failed");
    }
    Ok(Json(config))
}
