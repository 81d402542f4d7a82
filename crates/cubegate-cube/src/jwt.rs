use chrono::{Duration, Utc};
use cubegate_core::GatewayError;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

#[derive(Serialize)]
struct Claims {
    #[serde(rename = "databaseId")]
    database_id: String,
    iat: i64,
    exp: i64,
}

/// Mint a short-lived token carrying `{databaseId}`, used to authenticate
/// a single cube-engine request. A fresh token is minted per call rather
/// than cached — the cube engine's clock skew tolerance plus a short TTL
/// makes reuse not worth the bookkeeping.
pub fn mint_database_token(
    database_id: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, GatewayError> {
    let now = Utc::now();
    let claims = Claims {
        database_id: database_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| GatewayError::Internal(format!("failed to mint cube engine token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_a_well_formed_token() {
        let token = mint_database_token("db-1", "secret", 60).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }
}
