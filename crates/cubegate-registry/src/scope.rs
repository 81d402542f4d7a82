use sha2::{Digest, Sha256};

const TENANT_HASH_HEX_LEN: usize = 12;

/// The deterministic database id for a `(slug, tenant)` pair (spec §3/§4.2).
/// Self-hosted (`tenant_id=None`) reduces to the slug itself; a tenanted
/// database gets the slug suffixed with the first 12 hex characters of
/// `sha256(tenant_id)`, so the same slug never collides across tenants and
/// the same `(slug, tenant)` always resolves to the same id.
pub fn scope_database_id(slug: &str, tenant_id: Option<&str>) -> String {
    match tenant_id {
        None => slug.to_string(),
        Some(tenant_id) => {
            let mut hasher = Sha256::new();
            hasher.update(tenant_id.as_bytes());
            let digest = hex::encode(hasher.finalize());
            format!("{slug}-{}", &digest[..TENANT_HASH_HEX_LEN])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_hosted_id_is_the_bare_slug() {
        assert_eq!(scope_database_id("default", None), "default");
    }

    #[test]
    fn tenanted_id_is_deterministic_and_tenant_specific() {
        let a = scope_database_id("default", Some("tenant-1"));
        let b = scope_database_id("default", Some("tenant-1"));
        let c = scope_database_id("default", Some("tenant-2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("default-"));
        assert_eq!(a.len(), "default-".len() + TENANT_HASH_HEX_LEN);
    }
}
