//! Tenant resolution and role-gating middleware.
//!
//! Resolves the current tenant from a tenant API key or identity-provider
//! headers and attaches the result to request extensions for downstream
//! handlers. Building an actual identity provider is out of scope here —
//! the "session" this module parses is the set of headers a fronting
//! identity provider is assumed to inject on every request.
//!
//! # Resolution chain
//!
//! 1. **API key** (`Authorization: Bearer mft_...`): hashed and looked up
//!    in the registry; grants the key's tenant and full (admin) access.
//! 2. **`x-tenant-id` header**: an already-materialized tenant id from a
//!    prior bootstrap; verified against the registry, role taken from
//!    `x-org-role` if present.
//! 3. **`x-org-id` header** (first sight of a tenant): materializes a new
//!    tenant row, preferring `x-org-slug`/`x-org-name` for slug generation
//!    and falling back to a slug derived from the org id.
//!
//! For self-hosted deployments (`AUTH_ENABLED=false`) resolution never
//! runs and every tenant field stays `None`, so tenant-scoped store calls
//! become no-ops.
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cubegate_core::GatewayError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

const TENANT_ID_HEADER: &str = "x-tenant-id";
const ORG_ID_HEADER: &str = "x-org-id";
const ORG_NAME_HEADER: &str = "x-org-name";
const ORG_SLUG_HEADER: &str = "x-org-slug";
const ORG_ROLE_HEADER: &str = "x-org-role";
const API_KEY_PREFIX: &str = "mft_";

/// Role asserted by the identity provider for the current principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    Admin,
    Member,
}

impl OrgRole {
    fn from_header(value: &str) -> OrgRole {
        if value == "org:admin" {
            OrgRole::Admin
        } else {
            OrgRole::Member
        }
    }
}

/// How a [`ResolvedTenant`] was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSource {
    ApiKey,
    Header,
    Bootstrapped,
}

/// The tenant context attached to a request's extensions once resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTenant {
    tenant_id: String,
    slug: String,
    role: OrgRole,
    source: TenantSource,
}

impl ResolvedTenant {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn role(&self) -> OrgRole {
        self.role
    }

    pub fn source(&self) -> TenantSource {
        self.source
    }

    pub fn is_admin(&self) -> bool {
        self.role == OrgRole::Admin
    }

    #[cfg(test)]
    pub(crate) fn for_test(tenant_id: String, slug: String, role: OrgRole, source: TenantSource) -> Self {
        ResolvedTenant { tenant_id, slug, role, source }
    }
}

#[derive(Debug, Serialize)]
struct TenantErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

fn tenant_error(status: StatusCode, error: &GatewayError) -> Response {
    (
        status,
        Json(TenantErrorResponse {
            error: error.code().to_string(),
            message: error.to_string(),
            request_id: None,
        }),
    )
        .into_response()
}

fn hash_api_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| s.starts_with(API_KEY_PREFIX))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolve the current tenant from request headers, without blocking the
/// request — absence of any credential is not an error at this layer.
fn resolve_tenant(state: &AppState, headers: &HeaderMap) -> Result<Option<ResolvedTenant>, GatewayError> {
    if !state.config().auth_enabled {
        return Ok(None);
    }

    if let Some(raw_key) = extract_api_key(headers) {
        let key_hash = hash_api_key(&raw_key);
        if let Some(key) = state.store().get_api_key_by_hash(&key_hash)? {
            if key.is_valid(chrono::Utc::now()) {
                let tenant_id = key
                    .tenant_id
                    .clone()
                    .ok_or_else(|| GatewayError::Internal("tenant api key has no tenant".to_string()))?;
                let tenant = state
                    .store()
                    .get_tenant(&tenant_id)?
                    .ok_or_else(|| GatewayError::NotFound(format!("tenant {tenant_id}")))?;
                let _ = state.store().touch_api_key_last_used(&key.id);
                return Ok(Some(ResolvedTenant {
                    tenant_id: tenant.id,
                    slug: tenant.slug,
                    role: OrgRole::Admin,
                    source: TenantSource::ApiKey,
                }));
            }
        }
    }

    if let Some(tenant_id) = header_str(headers, TENANT_ID_HEADER) {
        if let Some(tenant) = state.store().get_tenant(tenant_id)? {
            let role = header_str(headers, ORG_ROLE_HEADER)
                .map(OrgRole::from_header)
                .unwrap_or(OrgRole::Member);
            return Ok(Some(ResolvedTenant {
                tenant_id: tenant.id,
                slug: tenant.slug,
                role,
                source: TenantSource::Header,
            }));
        }
    }

    if let Some(org_id) = header_str(headers, ORG_ID_HEADER) {
        let name = header_str(headers, ORG_NAME_HEADER);
        let slug_hint = header_str(headers, ORG_SLUG_HEADER);
        let role = header_str(headers, ORG_ROLE_HEADER)
            .map(OrgRole::from_header)
            .unwrap_or(OrgRole::Member);
        let tenant = materialize_tenant(state, org_id, slug_hint, name)?;
        return Ok(Some(ResolvedTenant {
            tenant_id: tenant.id,
            slug: tenant.slug,
            role,
            source: TenantSource::Bootstrapped,
        }));
    }

    Ok(None)
}

/// Get-or-create the tenant row for an identity-provider org. New tenants
/// get a fire-and-forget default database; failures there are warnings,
/// not request failures.
fn materialize_tenant(
    state: &AppState,
    org_id: &str,
    slug_hint: Option<&str>,
    name: Option<&str>,
) -> Result<cubegate_core::Tenant, GatewayError> {
    let preferred = slug_hint
        .map(str::to_string)
        .or_else(|| name.map(crate::slug::slugify))
        .unwrap_or_else(|| crate::slug::slugify(org_id));
    let slug = crate::slug::unique_slug(state.store().as_ref(), &preferred)?;

    if let Some(existing) = state.store().get_tenant_by_slug(&slug)? {
        return Ok(existing);
    }

    let created = state.store().create_tenant(&slug, name)?;
    if let Err(e) = state
        .registry()
        .initialize_default_database(default_connection())
    {
        warn!(tenant_id = %created.id, error = %e, "failed to provision default database for new tenant");
    }
    Ok(created)
}

fn default_connection() -> cubegate_core::ConnectionConfig {
    cubegate_core::ConnectionConfig::Postgres {
        host: "localhost".to_string(),
        port: 5432,
        database: "cubegate".to_string(),
        user: "cubegate".to_string(),
        password: None,
        ssl: None,
    }
}

/// Always runs; attaches `Option<ResolvedTenant>` to the request's
/// extensions and lets the request through either way. Endpoints that
/// need a tenant reach for it with [`require_tenant`] or
/// [`require_org_admin`].
pub async fn resolve_tenant_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match resolve_tenant(&state, req.headers()) {
        Ok(resolved) => {
            req.extensions_mut().insert(resolved);
            next.run(req).await
        }
        Err(e) => tenant_error(StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), &e),
    }
}

/// Blocks requests that have no resolved tenant while auth is enabled. A
/// self-hosted deployment (auth disabled) always passes through with no
/// tenant at all — its downstream store calls take `tenant_id: None` and
/// become no-ops.
pub async fn require_tenant(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if !state.config().auth_enabled {
        return next.run(req).await;
    }
    let tenant = req.extensions().get::<Option<ResolvedTenant>>().cloned().flatten();
    match tenant {
        Some(_) => next.run(req).await,
        None => tenant_error(StatusCode::UNAUTHORIZED, &GatewayError::Unauthenticated),
    }
}

/// Blocks mutating tenant-administration endpoints (API key CRUD, slug
/// rename) unless the resolved principal carries `org:admin`.
pub async fn require_org_admin(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if !state.config().auth_enabled {
        return next.run(req).await;
    }
    let tenant = req.extensions().get::<Option<ResolvedTenant>>().cloned().flatten();
    match tenant {
        None => tenant_error(StatusCode::FORBIDDEN, &GatewayError::OrgRequired),
        Some(t) if !t.is_admin() => {
            tenant_error(StatusCode::FORBIDDEN, &GatewayError::ForbiddenNotAdmin)
        }
        Some(_) => next.run(req).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::state::AppState;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use cubegate_catalog::CatalogRegistry;
    use cubegate_registry::RegistryManager;
    use cubegate_storage::{RegistryStore, SqliteRegistryStore};
    use tower::ServiceExt;

    fn state(auth_enabled: bool) -> (AppState, std::sync::Arc<dyn RegistryStore>) {
        let store: std::sync::Arc<dyn RegistryStore> =
            std::sync::Arc::new(SqliteRegistryStore::open_in_memory(b"test-secret").unwrap());
        let registry = std::sync::Arc::new(RegistryManager::new(store.clone()));
        let config = GatewayConfig { auth_enabled, ..GatewayConfig::default() };
        let app_state = AppState::new(registry, std::sync::Arc::new(CatalogRegistry::new()), config);
        (app_state, store)
    }

    #[test]
    fn org_role_recognizes_only_the_admin_sentinel() {
        assert_eq!(OrgRole::from_header("org:admin"), OrgRole::Admin);
        assert_eq!(OrgRole::from_header("org:member"), OrgRole::Member);
        assert_eq!(OrgRole::from_header("anything-else"), OrgRole::Member);
    }

    #[test]
    fn extract_api_key_requires_bearer_and_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer mft_abc123".parse().unwrap());
        assert_eq!(extract_api_key(&headers).as_deref(), Some("mft_abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer sk_other".parse().unwrap());
        assert!(extract_api_key(&headers).is_none());

        assert!(extract_api_key(&HeaderMap::new()).is_none());
    }

    #[test]
    fn hash_api_key_is_deterministic_and_not_the_raw_value() {
        let hashed = hash_api_key("mft_abc123");
        assert_eq!(hashed, hash_api_key("mft_abc123"));
        assert_ne!(hashed, "mft_abc123");
    }

    #[test]
    fn resolve_tenant_is_a_noop_when_auth_disabled() {
        let (state, _store) = state(false);
        let headers = HeaderMap::new();
        assert!(resolve_tenant(&state, &headers).unwrap().is_none());
    }

    #[test]
    fn resolve_tenant_from_known_tenant_id_header() {
        let (state, store) = state(true);
        let tenant = store.create_tenant("acme", Some("Acme")).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, tenant.id.parse().unwrap());
        headers.insert(ORG_ROLE_HEADER, "org:admin".parse().unwrap());

        let resolved = resolve_tenant(&state, &headers).unwrap().unwrap();
        assert_eq!(resolved.tenant_id(), tenant.id);
        assert_eq!(resolved.source(), TenantSource::Header);
        assert!(resolved.is_admin());
    }

    #[test]
    fn resolve_tenant_bootstraps_from_org_id_header() {
        let (state, _store) = state(true);
        let mut headers = HeaderMap::new();
        headers.insert(ORG_ID_HEADER, "org_123".parse().unwrap());
        headers.insert(ORG_NAME_HEADER, "New Org".parse().unwrap());

        let resolved = resolve_tenant(&state, &headers).unwrap().unwrap();
        assert_eq!(resolved.slug(), "new-org");
        assert_eq!(resolved.source(), TenantSource::Bootstrapped);
    }

    #[test]
    fn resolve_tenant_with_unknown_tenant_id_header_falls_through_to_none() {
        let (state, _store) = state(true);
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, "no-such-tenant".parse().unwrap());
        assert!(resolve_tenant(&state, &headers).unwrap().is_none());
    }

    async fn mock_handler() -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn require_tenant_blocks_when_auth_enabled_and_nothing_resolved() {
        let (state, _store) = state(true);
        let app = Router::new()
            .route("/", get(mock_handler))
            .layer(middleware::from_fn_with_state(state.clone(), require_tenant))
            .layer(middleware::from_fn_with_state(state.clone(), resolve_tenant_middleware))
            .with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn require_tenant_passes_through_when_auth_disabled() {
        let (state, _store) = state(false);
        let app = Router::new()
            .route("/", get(mock_handler))
            .layer(middleware::from_fn_with_state(state.clone(), require_tenant))
            .with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn require_org_admin_forbids_a_non_admin_tenant() {
        let (state, store) = state(true);
        let tenant = store.create_tenant("acme", None).unwrap();
        let app = Router::new()
            .route("/", get(mock_handler))
            .layer(middleware::from_fn_with_state(state.clone(), require_org_admin))
            .layer(middleware::from_fn_with_state(state.clone(), resolve_tenant_middleware))
            .with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(TENANT_ID_HEADER, tenant.id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
