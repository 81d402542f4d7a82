use crate::auth::ResolvedTenant;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Extension, Path, State};
use axum::Json;
use chrono::Utc;
use cubegate_core::{ApiKey, CreatedApiKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "mft_";
const KEY_BYTES: usize = 24;

fn tenant_id(tenant: &Option<ResolvedTenant>) -> Option<&str> {
    tenant.as_ref().map(ResolvedTenant::tenant_id)
}

/// `ApiKey` without its hash — the hash never needs to leave the store once
/// the raw key has been shown to the caller.
#[derive(Debug, Serialize)]
pub struct ApiKeySummary {
    pub id: String,
    pub name: String,
    pub key_prefix: String,
    pub created_at: chrono::DateTime<Utc>,
    pub last_used_at: Option<chrono::DateTime<Utc>>,
    pub expires_at: Option<chrono::DateTime<Utc>>,
    pub revoked_at: Option<chrono::DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeySummary {
    fn from(key: ApiKey) -> Self {
        ApiKeySummary {
            id: key.id,
            name: key.name,
            key_prefix: key.key_prefix,
            created_at: key.created_at,
            last_used_at: key.last_used_at,
            expires_at: key.expires_at,
            revoked_at: key.revoked_at,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
) -> Result<Json<Vec<ApiKeySummary>>, ApiError> {
    let keys = state
        .store()
        .list_api_keys(tenant_id(&tenant))?
        .into_iter()
        .map(ApiKeySummary::from)
        .collect();
    Ok(Json(keys))
}

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<Utc>>,
}

fn generate_raw_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

fn hash_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Json(body): Json<CreateApiKeyRequest>,
) -> Result<Json<CreatedApiKey>, ApiError> {
    let raw_key = generate_raw_key();
    let key_hash = hash_key(&raw_key);
    let key_prefix = raw_key.chars().take(12).collect::<String>();
    let now = Utc::now();

    let key = ApiKey {
        id: uuid::Uuid::new_v4().to_string(),
        tenant_id: tenant_id(&tenant).map(String::from),
        name: body.name,
        key_hash,
        key_prefix: key_prefix.clone(),
        created_by: tenant.as_ref().map(|t| t.tenant_id().to_string()),
        created_at: now,
        last_used_at: None,
        expires_at: body.expires_at,
        revoked_at: None,
    };
    let created = state.store().create_api_key(&key)?;

    Ok(Json(CreatedApiKey {
        id: created.id,
        name: created.name,
        raw_key,
        key_prefix,
        created_at: created.created_at,
    }))
}

pub async fn revoke(
    State(state): State<AppState>,
    Extension(tenant): Extension<Option<ResolvedTenant>>,
    Path(id): Path<String>,
) -> Result<(), ApiError> {
    state.store().revoke_api_key(tenant_id(&tenant), &id)?;
    Ok(())
}
