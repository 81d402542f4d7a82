use crate::auth::ResolvedTenant;
use crate::error::ApiError;
use crate::slug;
use crate::state::AppState;
use axum::{extract::{Extension, State}, Json};
use cubegate_core::GatewayError;
use serde::{Deserialize, Serialize};

/// `id`/`slug` are `None` for a self-hosted deployment with no resolved
/// tenant — there is nothing to summarize, but the endpoint still answers.
#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub name: Option<String>,
}

pub async fn get_current_tenant(
    Extension(tenant): Extension<Option<ResolvedTenant>>,
) -> Json<TenantSummary> {
    Json(match tenant {
        Some(t) => TenantSummary {
            id: Some(t.tenant_id().to_string()),
            slug: Some(t.slug().to_string()),
            name: None,
        },
        None => TenantSummary { id: None, slug: None, name: None },
    })
}

#[derive(Debug, Deserialize)]
pub struct RenameSlugRequest {
    pub slug: String,
}

pub async fn rename_slug(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Json(body): Json<RenameSlugRequest>,
) -> Result<Json<TenantSummary>, ApiError> {
    let tenant = tenant.ok_or(GatewayError::OrgRequired)?;
    slug::validate_slug(&body.slug)?;

    // Precheck, then let the unique index have the final word — a
    // concurrent rename to the same slug surfaces 409 either way.
    if state.store().get_tenant_by_slug(&body.slug)?.is_some() {
        return Err(GatewayError::SlugTaken(body.slug).into());
    }

    let updated = state
        .store()
        .update_tenant_slug(tenant.tenant_id(), &body.slug)?;
    Ok(Json(TenantSummary {
        id: Some(updated.id),
        slug: Some(updated.slug),
        name: updated.name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{OrgRole, TenantSource};
    use crate::config::GatewayConfig;
    use cubegate_catalog::CatalogRegistry;
    use cubegate_registry::RegistryManager;
    use cubegate_storage::SqliteRegistryStore;
    use std::sync::Arc;

    fn state() -> (AppState, Arc<dyn cubegate_storage::RegistryStore>) {
        let store: Arc<dyn cubegate_storage::RegistryStore> =
            Arc::new(SqliteRegistryStore::open_in_memory(b"test-secret").unwrap());
        let registry = Arc::new(RegistryManager::new(store.clone()));
        let app_state = AppState::new(registry, Arc::new(CatalogRegistry::new()), GatewayConfig::default());
        (app_state, store)
    }

    #[tokio::test]
    async fn current_tenant_is_empty_when_none_resolved() {
        let summary = get_current_tenant(Extension(None)).await;
        assert!(summary.0.id.is_none());
        assert!(summary.0.slug.is_none());
    }

    #[tokio::test]
    async fn rename_slug_without_a_tenant_requires_org() {
        let (state, _store) = state();
        let err = rename_slug(
            State(state),
            Extension(None),
            Json(RenameSlugRequest { slug: "new-slug".to_string() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "ORG_REQUIRED");
    }

    #[tokio::test]
    async fn rename_slug_to_one_already_taken_conflicts() {
        let (state, store) = state();
        let tenant = store.create_tenant("acme", None).unwrap();
        store.create_tenant("other", None).unwrap();

        let resolved = ResolvedTenant::for_test(tenant.id.clone(), tenant.slug.clone(), OrgRole::Admin, TenantSource::Header);
        let err = rename_slug(
            State(state),
            Extension(Some(resolved)),
            Json(RenameSlugRequest { slug: "other".to_string() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0.code(), "SLUG_TAKEN");
    }

    #[tokio::test]
    async fn rename_slug_succeeds_for_a_free_slug() {
        let (state, store) = state();
        let tenant = store.create_tenant("acme", None).unwrap();

        let resolved = ResolvedTenant::for_test(tenant.id.clone(), tenant.slug.clone(), OrgRole::Admin, TenantSource::Header);
        let updated = rename_slug(
            State(state),
            Extension(Some(resolved)),
            Json(RenameSlugRequest { slug: "acme-renamed".to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.slug.as_deref(), Some("acme-renamed"));
    }
}
