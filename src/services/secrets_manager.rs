use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const NONCE_LEN: usize = 12;

/// Encrypts OAuth tokens before they reach the credential store.
///
/// Ciphertext layout is `base64(nonce || aes-256-gcm(plaintext))`.
#[derive(Clone)]
pub struct SecretsManager {
    key: Vec<u8>,
}

impl std::fmt::Debug for SecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManager")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SecretsManager {
    /// Loads the key from `CREDENTIAL_MASTER_KEY` (base64, 32 bytes).
    pub fn new() -> Result<Self> {
        match std::env::var("CREDENTIAL_MASTER_KEY") {
            Ok(key) if !key.trim().is_empty() => Self::from_base64_key(&key),
            _ => {
                tracing::warn!("CREDENTIAL_MASTER_KEY not set, using development key (INSECURE!)");
                Ok(Self {
                    key: b"subpanel-development-only-key-32".to_vec(),
                })
            }
        }
    }

    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| anyhow!("Invalid master key encoding: {}", e))?;

        if key.len() != 32 {
            return Err(anyhow!("Master key must be exactly 32 bytes"));
        }

        Ok(Self { key })
    }

    pub fn generate_master_key() -> String {
        use rand::RngCore;
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        BASE64.encode(key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {}", e))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(&combined))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String> {
        let combined = BASE64
            .decode(encrypted)
            .map_err(|e| anyhow!("Invalid encrypted data encoding: {}", e))?;

        if combined.len() < NONCE_LEN {
            return Err(anyhow!("Invalid encrypted data: too short"));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| anyhow!("Decryption failed: {}", e))?;

        String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8 in decrypted data: {}", e))
    }

    pub fn encrypt_optional(&self, plaintext: Option<&str>) -> Result<Option<String>> {
        plaintext.map(|value| self.encrypt(value)).transpose()
    }

    pub fn decrypt_optional(&self, encrypted: Option<&str>) -> Result<Option<String>> {
        encrypted.map(|value| self.decrypt(value)).transpose()
    }
}
