//! The admin REST surface (spec §4.9): tenant, database, cube file,
//! catalog, query, and API key management over the same [`AppState`] the
//! MCP transports use.

mod api_keys;
mod catalog;
mod cubes;
mod databases;
mod query;
mod system;
mod tenants;

use crate::auth::{require_org_admin, require_tenant, resolve_tenant_middleware};
use crate::state::AppState;
use axum::{middleware, routing::{delete, get, post, put}, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full admin API router, including the tenant-resolution
/// middleware. Mount alongside [`cubegate_mcp::mcp_router`] in the server
/// binary.
pub fn admin_router(state: AppState) -> Router {
    let admin_only = middleware::from_fn_with_state(state.clone(), require_org_admin);

    let tenant_scoped = Router::new()
        .route("/api/tenant", get(tenants::get_current_tenant))
        .route(
            "/api/tenant/slug",
            put(tenants::rename_slug).layer(admin_only.clone()),
        )
        .route("/api/databases", get(databases::list).post(databases::create))
        .route(
            "/api/databases/initialize-default",
            post(databases::initialize_default),
        )
        .route(
            "/api/databases/:id",
            get(databases::get_one).put(databases::update).delete(databases::delete_one),
        )
        .route("/api/databases/:id/activate", post(databases::activate))
        .route("/api/databases/:id/deactivate", post(databases::deactivate))
        .route("/api/databases/:id/test", post(databases::test))
        .route("/api/cubes", get(cubes::list))
        .route("/api/cubes/:file_name", get(cubes::get_one).put(cubes::upsert).delete(cubes::delete_one))
        .route("/api/catalog", get(catalog::get_config).put(catalog::put_config))
        .route("/api/query/validate", post(query::validate))
        .route("/api/query/sql", post(query::sql))
        .route("/api/query/execute", post(query::execute))
        .route(
            "/api/api-keys",
            get(api_keys::list).merge(post(api_keys::create).layer(admin_only.clone())),
        )
        .route(
            "/api/api-keys/:id",
            delete(api_keys::revoke).layer(admin_only),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_tenant));

    Router::new()
        .route("/api/config", get(system::public_config))
        .route("/api/health", get(system::health))
        .route("/api/version", get(system::version))
        .merge(tenant_scoped)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_tenant_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
