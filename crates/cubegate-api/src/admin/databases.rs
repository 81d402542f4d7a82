use crate::auth::ResolvedTenant;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use cubegate_core::{ConnectionConfig, DatabaseConfig, GatewayError, QueryFilter};
use cubegate_storage::DatabaseUpdate;
use serde::Deserialize;

fn tenant_id(tenant: &Option<ResolvedTenant>) -> Option<&str> {
    tenant.as_ref().map(ResolvedTenant::tenant_id)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
) -> Result<Json<Vec<DatabaseConfig>>, ApiError> {
    let databases = state
        .registry()
        .list_databases(tenant_id(&tenant))?
        .iter()
        .map(DatabaseConfig::redacted)
        .collect();
    Ok(Json(databases))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
) -> Result<Json<DatabaseConfig>, ApiError> {
    let database = state.registry().lookup_database(tenant_id(&tenant), &id)?;
    Ok(Json(database.redacted()))
}

#[derive(Debug, Deserialize)]
pub struct CreateDatabaseRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub connection: ConnectionConfig,
    pub max_limit: u64,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Json(body): Json<CreateDatabaseRequest>,
) -> Result<Json<DatabaseConfig>, ApiError> {
    let database = state.registry().create_database(
        tenant_id(&tenant),
        &body.slug,
        &body.name,
        body.description.as_deref(),
        body.connection,
        body.max_limit,
    )?;
    Ok(Json(database.redacted()))
}

/// Every field is optional; absent means "leave unchanged". `jwt_secret` is
/// not exposed here — it is generated once at creation and never admin-set.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateDatabaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub connection: Option<ConnectionConfig>,
    pub cube_api_url: Option<String>,
    pub max_limit: Option<u64>,
    pub deny_members: Option<Vec<String>>,
    pub default_segments: Option<Vec<String>>,
    pub default_filters: Option<Vec<QueryFilter>>,
    pub return_sql: Option<bool>,
}

pub async fn update(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateDatabaseRequest>,
) -> Result<Json<DatabaseConfig>, ApiError> {
    let tid = tenant_id(&tenant);
    if body.connection.is_some() {
        let current = state.registry().lookup_database(tid, &id)?;
        if current.status == cubegate_core::DatabaseStatus::Active {
            return Err(GatewayError::ActiveCannotMutateConnection(id).into());
        }
    }
    let update = DatabaseUpdate {
        name: body.name,
        description: body.description.map(Some),
        connection: body.connection,
        cube_api_url: body.cube_api_url.map(Some),
        jwt_secret: None,
        max_limit: body.max_limit,
        deny_members: body.deny_members,
        default_segments: body.default_segments,
        default_filters: body.default_filters,
        return_sql: body.return_sql,
    };
    let database = state.registry().update_database(tid, &id, update)?;
    Ok(Json(database.redacted()))
}

pub async fn delete_one(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    let tid = tenant_id(&tenant);
    let database = state.registry().lookup_database(tid, &id)?;
    if database.slug == "default" {
        return Err(GatewayError::UndeletableDefault.into());
    }
    if database.status == cubegate_core::DatabaseStatus::Active {
        return Err(GatewayError::ActiveCannotDelete(id).into());
    }
    state.registry().delete_database(tid, &id)?;
    Ok(())
}

pub async fn activate(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
) -> Result<Json<DatabaseConfig>, ApiError> {
    let database = state.registry().activate_database(tenant_id(&tenant), &id)?;
    if let Err(e) = state.refresh_catalog(&database).await {
        tracing::warn!(database_id = %id, error = %e, "catalog refresh on activation failed");
    }
    Ok(Json(database.redacted()))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
) -> Result<Json<DatabaseConfig>, ApiError> {
    let database = state.registry().deactivate_database(tenant_id(&tenant), &id)?;
    Ok(Json(database.redacted()))
}

pub async fn test(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let database = state.registry().lookup_database(tenant_id(&tenant), &id)?;
    state.registry().test_connection(&database.connection)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn initialize_default(
    State(state): State<AppState>,
) -> Result<Json<DatabaseConfig>, ApiError> {
    let database = state
        .registry()
        .initialize_default_database(default_connection())?;
    if database.status != cubegate_core::DatabaseStatus::Active {
        let activated = state
            .registry()
            .activate_database(database.tenant_id.as_deref(), &database.id)?;
        return Ok(Json(activated.redacted()));
    }
    Ok(Json(database.redacted()))
}

fn default_connection() -> ConnectionConfig {
    ConnectionConfig::Postgres {
        host: "localhost".to_string(),
        port: 5432,
        database: "cubegate".to_string(),
        user: "cubegate".to_string(),
        password: None,
        ssl: None,
    }
}
