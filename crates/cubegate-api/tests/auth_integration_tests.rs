//! Integration tests for tenant resolution and role-gating.
//!
//! Drives the real `admin_router` with `AUTH_ENABLED` turned on, exercising
//! the three resolution paths (API key, `x-tenant-id` header, `x-org-id`
//! bootstrap) and the admin-only gate purely through HTTP requests and
//! headers, the way a fronting identity provider would.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use cubegate_api::{admin_router, AppState, GatewayConfig};
use cubegate_catalog::CatalogRegistry;
use cubegate_registry::RegistryManager;
use cubegate_storage::{RegistryStore, SqliteRegistryStore};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn authed_state() -> (AppState, Arc<dyn RegistryStore>) {
    let store: Arc<dyn RegistryStore> =
        Arc::new(SqliteRegistryStore::open_in_memory(b"test-secret").unwrap());
    let registry = Arc::new(RegistryManager::new(store.clone()));
    let catalog = Arc::new(CatalogRegistry::new());
    let config = GatewayConfig {
        auth_enabled: true,
        ..GatewayConfig::default()
    };
    (AppState::new(registry, catalog, config), store)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_headers(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn request_without_any_credential_is_unauthenticated() {
    let (state, _store) = authed_state();
    let app = admin_router(state);
    let response = app.oneshot(get("/api/databases")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn health_and_public_config_stay_open_without_auth() {
    let (state, _store) = authed_state();
    let app = admin_router(state);
    let response = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/api/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn known_tenant_id_header_resolves_as_member() {
    let (state, store) = authed_state();
    let tenant = store.create_tenant("acme", Some("Acme")).unwrap();
    let app = admin_router(state);

    let response = app
        .oneshot(get_with_headers(
            "/api/tenant",
            &[("x-tenant-id", &tenant.id)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["slug"], "acme");
}

#[tokio::test]
async fn unknown_tenant_id_header_is_treated_as_unauthenticated() {
    let (state, _store) = authed_state();
    let app = admin_router(state);
    let response = app
        .oneshot(get_with_headers(
            "/api/databases",
            &[("x-tenant-id", "does-not-exist")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn member_role_is_rejected_from_admin_only_endpoint() {
    let (state, store) = authed_state();
    let tenant = store.create_tenant("acme", Some("Acme")).unwrap();
    let app = admin_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/tenant/slug")
                .header("x-tenant-id", &tenant.id)
                .header("x-org-role", "org:member")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"slug":"acme-renamed"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "FORBIDDEN_NOT_ADMIN");
}

#[tokio::test]
async fn admin_role_is_allowed_to_rename_slug() {
    let (state, store) = authed_state();
    let tenant = store.create_tenant("acme", Some("Acme")).unwrap();
    let app = admin_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/tenant/slug")
                .header("x-tenant-id", &tenant.id)
                .header("x-org-role", "org:admin")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"slug":"acme-renamed"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["slug"], "acme-renamed");
}

#[tokio::test]
async fn first_sighting_of_an_org_id_bootstraps_a_tenant() {
    let (state, _store) = authed_state();
    let app = admin_router(state);

    let response = app
        .oneshot(get_with_headers(
            "/api/tenant",
            &[("x-org-id", "org_123"), ("x-org-name", "New Org")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["slug"], "new-org");
}

#[tokio::test]
async fn bootstrap_is_idempotent_across_requests() {
    let (state, _store) = authed_state();
    let app = admin_router(state);

    let first = body_json(
        app.clone()
            .oneshot(get_with_headers("/api/tenant", &[("x-org-id", "org_123")]))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(
        app.oneshot(get_with_headers("/api/tenant", &[("x-org-id", "org_123")]))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["slug"], second["slug"]);
}

#[tokio::test]
async fn valid_api_key_grants_admin_access_to_its_tenant() {
    let (state, _store) = authed_state();
    let app = admin_router(state);

    // Bootstrap a tenant via header, then create an API key for it.
    let bootstrap = body_json(
        app.clone()
            .oneshot(get_with_headers(
                "/api/tenant",
                &[("x-org-id", "org_1"), ("x-org-role", "org:admin")],
            ))
            .await
            .unwrap(),
    )
    .await;
    let tenant_id = bootstrap["id"].as_str().unwrap().to_string();

    let created = body_json(
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/api-keys")
                    .header("x-org-id", "org_1")
                    .header("x-org-role", "org:admin")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"ci"}"#))
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;
    let raw_key = created["raw_key"].as_str().unwrap();

    let response = app
        .oneshot(get_with_headers(
            "/api/tenant",
            &[("authorization", &format!("Bearer {raw_key}"))],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], tenant_id);
}

#[tokio::test]
async fn malformed_bearer_token_falls_through_to_unauthenticated() {
    let (state, _store) = authed_state();
    let app = admin_router(state);
    let response = app
        .oneshot(get_with_headers(
            "/api/databases",
            &[("authorization", "Bearer not-a-real-key")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
