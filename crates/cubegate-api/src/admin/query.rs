use crate::auth::ResolvedTenant;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::Json;
use cubegate_core::{CubeQuery, DatabaseConfig, GatewayError};
use cubegate_cube::CubeClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DatabaseScope {
    pub database: String,
}

fn tenant_id(tenant: &Option<ResolvedTenant>) -> Option<&str> {
    tenant.as_ref().map(ResolvedTenant::tenant_id)
}

async fn resolve(
    state: &AppState,
    tenant: &Option<ResolvedTenant>,
    database_id: &str,
) -> Result<(DatabaseConfig, CubeClient), ApiError> {
    let database = state.registry().lookup_database(tenant_id(tenant), database_id)?;
    let cube_api_url = database.cube_api_url.clone().ok_or_else(|| GatewayError::Validation {
        message: format!("database {database_id} has no cube engine URL configured"),
        details: None,
    })?;
    Ok((database, CubeClient::new(cube_api_url)))
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<cubegate_core::ToolError>,
}

pub async fn validate(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Json(raw_query): Json<serde_json::Value>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let database = state
        .registry()
        .lookup_database(tenant_id(&tenant), &scope.database)?;
    let index = state.catalog().get(&scope.database)?;

    let outcome = CubeQuery::from_value(&raw_query)
        .and_then(|query| cubegate_policy::PolicyEnforcer::validate(&database, &index, &query));

    match outcome {
        Ok(()) => Ok(Json(ValidateResponse { valid: true, error: None })),
        Err(e) => Ok(Json(ValidateResponse {
            valid: false,
            error: Some(e.as_tool_error()),
        })),
    }
}

pub async fn sql(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Json(raw_query): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (database, client) = resolve(&state, &tenant, &scope.database).await?;
    let index = state.catalog().get(&scope.database)?;
    let query = CubeQuery::from_value(&raw_query)?;
    cubegate_policy::PolicyEnforcer::validate(&database, &index, &query)?;

    let jwt_secret = database
        .jwt_secret
        .as_deref()
        .ok_or_else(|| GatewayError::Internal("database has no signing secret".to_string()))?;
    let generated = client.sql(&database.id, jwt_secret, &query.to_value()).await?;
    Ok(Json(generated))
}

pub async fn execute(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Json(raw_query): Json<serde_json::Value>,
) -> Result<Json<cubegate_policy::QueryResult>, ApiError> {
    let (database, client) = resolve(&state, &tenant, &scope.database).await?;
    let index = state.catalog().get(&scope.database)?;
    let result = cubegate_policy::QueryPipeline::execute(&database, &index, &client, &raw_query).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use cubegate_catalog::{CatalogIndex, CatalogRegistry};
    use cubegate_core::{CatalogConfig, ConnectionConfig};
    use cubegate_cube::CubeMeta;
    use cubegate_registry::RegistryManager;
    use cubegate_storage::SqliteRegistryStore;
    use std::sync::Arc;

    fn state_with_database() -> (AppState, String) {
        let store = SqliteRegistryStore::open_in_memory(b"test-secret").unwrap();
        let registry = Arc::new(RegistryManager::new(Arc::new(store)));
        let database = registry
            .create_database(
                None,
                "analytics",
                "Analytics",
                None,
                ConnectionConfig::Postgres {
                    host: "localhost".to_string(),
                    port: 5432,
                    database: "d".to_string(),
                    user: "u".to_string(),
                    password: None,
                    ssl: None,
                },
                1000,
            )
            .unwrap();
        let catalog = Arc::new(CatalogRegistry::new());
        catalog.put(
            &database.id,
            CatalogIndex::build(&CubeMeta::default(), &CatalogConfig::default()),
        );
        let state = AppState::new(registry, catalog, GatewayConfig::default());
        (state, database.id)
    }

    #[tokio::test]
    async fn validating_an_unknown_member_reports_invalid() {
        let (state, database_id) = state_with_database();
        let response = validate(
            State(state),
            Extension(None),
            Query(DatabaseScope { database: database_id }),
            Json(serde_json::json!({ "measures": ["Orders.count"], "limit": 10 })),
        )
        .await
        .unwrap();
        assert!(!response.0.valid);
        assert_eq!(response.0.error.unwrap().code, "UNKNOWN_MEMBER");
    }

    #[tokio::test]
    async fn validating_against_an_unknown_database_is_not_found() {
        let (state, _) = state_with_database();
        let err = validate(
            State(state),
            Extension(None),
            Query(DatabaseScope { database: "missing".to_string() }),
            Json(serde_json::json!({ "measures": [], "limit": 10 })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn sql_against_a_database_with_no_cube_engine_url_is_a_validation_error() {
        let (state, database_id) = state_with_database();
        let err = sql(
            State(state),
            Extension(None),
            Query(DatabaseScope { database: database_id }),
            Json(serde_json::json!({ "measures": [] })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "VALIDATION_ERROR");
    }
}
