use crate::{jwt::mint_database_token, meta::CubeMeta};
use cubegate_core::GatewayError;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TOKEN_TTL_SECS: i64 = 300;

/// HTTP client for one cube-engine deployment's REST surface. The gateway
/// never retries a failed upstream call (spec: no internal retries) — a
/// caller that wants resilience builds it at a higher layer.
#[derive(Clone)]
pub struct CubeClient {
    http: reqwest::Client,
    base_url: String,
}

impl CubeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client builds with static configuration");
        CubeClient {
            http,
            base_url: base_url.into(),
        }
    }

    fn token(&self, database_id: &str, jwt_secret: &str) -> Result<String, GatewayError> {
        mint_database_token(database_id, jwt_secret, TOKEN_TTL_SECS)
    }

    /// `GET /meta` — cube/measure/dimension/segment metadata for this
    /// database's schema.
    pub async fn meta(&self, database_id: &str, jwt_secret: &str) -> Result<CubeMeta, GatewayError> {
        let token = self.token(database_id, jwt_secret)?;
        let response = self
            .http
            .get(format!("{}/meta", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamMetaUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamMetaUnavailable(format!(
                "{status}: {body}"
            )));
        }

        response
            .json::<CubeMeta>()
            .await
            .map_err(|e| GatewayError::UpstreamMetaUnavailable(e.to_string()))
    }

    /// `POST /load` — execute a normalized query and get back result rows
    /// (and, when the database has `return_sql` enabled, the generated SQL).
    pub async fn load(
        &self,
        database_id: &str,
        jwt_secret: &str,
        query: &Value,
    ) -> Result<Value, GatewayError> {
        let token = self.token(database_id, jwt_secret)?;
        let response = self
            .http
            .post(format!("{}/load", self.base_url))
            .bearer_auth(token)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamError {
                status: 0,
                body: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamError { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::UpstreamError {
                status,
                body: e.to_string(),
            })
    }

    /// `POST /sql` — ask the cube engine to render SQL for a query without
    /// executing it. Used when a database has `return_sql` enabled.
    pub async fn sql(
        &self,
        database_id: &str,
        jwt_secret: &str,
        query: &Value,
    ) -> Result<Value, GatewayError> {
        let token = self.token(database_id, jwt_secret)?;
        let response = self
            .http
            .post(format!("{}/sql", self.base_url))
            .bearer_auth(token)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamError {
                status: 0,
                body: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamError { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::UpstreamError {
                status,
                body: e.to_string(),
            })
    }
}
