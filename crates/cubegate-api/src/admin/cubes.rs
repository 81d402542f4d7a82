use crate::auth::ResolvedTenant;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use cubegate_core::CubeFile;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DatabaseScope {
    pub database: String,
}

fn tenant_id(tenant: &Option<ResolvedTenant>) -> Option<&str> {
    tenant.as_ref().map(ResolvedTenant::tenant_id)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
) -> Result<Json<Vec<CubeFile>>, ApiError> {
    let files = state
        .registry()
        .list_cube_files(tenant_id(&tenant), &scope.database)?;
    Ok(Json(files))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Path(file_name): Path<String>,
) -> Result<Json<CubeFile>, ApiError> {
    let file = state
        .registry()
        .get_cube_file(tenant_id(&tenant), &scope.database, &file_name)?;
    Ok(Json(file))
}

#[derive(Debug, Deserialize)]
pub struct UpsertCubeFileRequest {
    pub content: String,
}

pub async fn upsert(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Path(file_name): Path<String>,
    Json(body): Json<UpsertCubeFileRequest>,
) -> Result<Json<CubeFile>, ApiError> {
    let file = state.registry().put_cube_file(
        tenant_id(&tenant),
        &scope.database,
        &file_name,
        body.content,
    )?;
    Ok(Json(file))
}

pub async fn delete_one(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Query(scope): Query<DatabaseScope>,
    Path(file_name): Path<String>,
) -> Result<(), ApiError> {
    state
        .registry()
        .delete_cube_file(tenant_id(&tenant), &scope.database, &file_name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use cubegate_catalog::CatalogRegistry;
    use cubegate_core::ConnectionConfig;
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
        let state = AppState::new(registry, Arc::new(CatalogRegistry::new()), GatewayConfig::default());
        (state, database.id)
    }

    #[tokio::test]
    async fn upsert_then_list_then_get_then_delete() {
        let (state, database_id) = state_with_database();
        let scope = || DatabaseScope { database: database_id.clone() };

        let created = upsert(
            State(state.clone()),
            Extension(None),
            Query(scope()),
            Path("orders.yml".to_string()),
            Json(UpsertCubeFileRequest {
                content: "cubes: []".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(created.0.file_name, "orders.yml");

        let files = list(State(state.clone()), Extension(None), Query(scope()))
            .await
            .unwrap();
        assert_eq!(files.0.len(), 1);

        let fetched = get_one(
            State(state.clone()),
            Extension(None),
            Query(scope()),
            Path("orders.yml".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(fetched.0.content, "cubes: []");

        delete_one(
            State(state.clone()),
            Extension(None),
            Query(scope()),
            Path("orders.yml".to_string()),
        )
        .await
        .unwrap();

        let files = list(State(state), Extension(None), Query(scope())).await.unwrap();
        assert_eq!(files.0.len(), 0);
    }

    #[tokio::test]
    async fn getting_a_missing_file_is_not_found() {
        let (state, database_id) = state_with_database();
        let err = get_one(
            State(state),
            Extension(None),
            Query(DatabaseScope { database: database_id }),
            Path("missing.yml".to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "NOT_FOUND");
    }
}
