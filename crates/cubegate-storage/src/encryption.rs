//! Encryption-at-rest for connection secrets and JWT signing keys (spec §4.1).
//!
//! Ciphertext is stored as `ivHex:tagHex:ciphertextHex`. A value that does
//! not parse as that shape is treated as legacy plaintext and returned
//! unchanged by [`Encryptor::decrypt_or_plaintext`] — this lets a registry
//! seeded before encryption was turned on keep working without a migration.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use cubegate_core::GatewayError;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-256-GCM encryptor, keyed by HKDF-SHA256 over a master secret and a
/// per-deployment salt (the salt lives in `registry_meta`, generated once on
/// first boot).
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl Encryptor {
    pub fn new(master_secret: &[u8], salt: &[u8]) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(salt), master_secret);
        let mut key_bytes = [0u8; 32];
        hk.expand(b"cubegate-registry-encryption", &mut key_bytes)
            .expect("32 bytes is a valid HKDF output length");
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        let cipher = Aes256Gcm::new(key);
        key_bytes.zeroize();
        Encryptor { cipher }
    }

    /// Encrypt `plaintext`, returning `ivHex:tagHex:ciphertextHex`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, GatewayError> {
        let mut iv = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let combined = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| GatewayError::Internal(format!("encryption failed: {e}")))?;
        let split_at = combined.len().saturating_sub(TAG_LEN);
        let (ciphertext, tag) = combined.split_at(split_at);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(iv),
            hex::encode(tag),
            hex::encode(ciphertext)
        ))
    }

    /// Decrypt a value produced by [`Encryptor::encrypt`]. Fails if the
    /// value doesn't parse or authentication fails.
    pub fn decrypt(&self, stored: &str) -> Result<String, GatewayError> {
        let mut parts = stored.splitn(3, ':');
        let (iv_hex, tag_hex, ct_hex) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => {
                return Err(GatewayError::Internal(
                    "ciphertext is not in ivHex:tagHex:ciphertextHex form".to_string(),
                ))
            }
        };

        let iv = hex::decode(iv_hex)
            .map_err(|e| GatewayError::Internal(format!("invalid iv hex: {e}")))?;
        let tag = hex::decode(tag_hex)
            .map_err(|e| GatewayError::Internal(format!("invalid tag hex: {e}")))?;
        let ciphertext = hex::decode(ct_hex)
            .map_err(|e| GatewayError::Internal(format!("invalid ciphertext hex: {e}")))?;

        if iv.len() != NONCE_LEN {
            return Err(GatewayError::Internal("invalid iv length".to_string()));
        }

        let mut combined = ciphertext;
        combined.extend_from_slice(&tag);

        let nonce = Nonce::from_slice(&iv);
        let plaintext = self
            .cipher
            .decrypt(nonce, combined.as_ref())
            .map_err(|_| GatewayError::Internal("decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| GatewayError::Internal(format!("decrypted value is not utf-8: {e}")))
    }

    /// Best-effort decrypt: falls back to returning `stored` verbatim when
    /// it doesn't look like ciphertext this encryptor produced.
    pub fn decrypt_or_plaintext(&self, stored: &str) -> String {
        if looks_like_ciphertext(stored) {
            match self.decrypt(stored) {
                Ok(plain) => return plain,
                Err(e) => {
                    tracing::warn!(error = %e, "stored secret looked like ciphertext but failed to decrypt; treating as plaintext");
                }
            }
        }
        stored.to_string()
    }
}

fn looks_like_ciphertext(s: &str) -> bool {
    let parts: Vec<&str> = s.splitn(3, ':').collect();
    parts.len() == 3
        && parts[0].len() == NONCE_LEN * 2
        && parts[1].len() == TAG_LEN * 2
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Generate a fresh random salt for a new deployment.
pub fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
