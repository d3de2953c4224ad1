//! Credential holding and encryption for the upstream registrar API.
//!
//! The two-part credential pair (API key + secret API key) lives in memory
//! for the process lifetime and is persisted only in encrypted form: AES-256-GCM
//! with a key derived from an environment-supplied passphrase via Argon2id.
//! File I/O is explicit — the cipher operations themselves touch no external
//! systems.

use std::path::Path;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use zeroize::{Zeroize, Zeroizing};

use crate::error::BurrowError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// The upstream API credential pair. Zeroed on drop.
#[derive(Clone)]
pub struct CredentialPair {
    api_key: String,
    secret_api_key: String,
}

impl Drop for CredentialPair {
    fn drop(&mut self) {
        self.api_key.zeroize();
        self.secret_api_key.zeroize();
    }
}

impl std::fmt::Debug for CredentialPair {
    // Secrets never reach logs, even via {:?}
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("api_key", &"<redacted>")
            .field("secret_api_key", &"<redacted>")
            .finish()
    }
}

impl CredentialPair {
    /// Construct a credential pair, rejecting empty fields.
    pub fn new(api_key: impl Into<String>, secret_api_key: impl Into<String>) -> crate::Result<Self> {
        let api_key = api_key.into();
        let secret_api_key = secret_api_key.into();
        if api_key.is_empty() {
            return Err(BurrowError::Validation {
                field: "api_key".to_string(),
                reason: "API key must not be empty".to_string(),
            });
        }
        if secret_api_key.is_empty() {
            return Err(BurrowError::Validation {
                field: "secret_api_key".to_string(),
                reason: "secret API key must not be empty".to_string(),
            });
        }
        Ok(Self {
            api_key,
            secret_api_key,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret_api_key(&self) -> &str {
        &self.secret_api_key
    }

    /// Encrypt both fields with a passphrase-derived AES-256-GCM key.
    ///
    /// A fresh random salt and nonce are drawn per call, so encrypting the
    /// same pair twice yields distinct records.
    pub fn encrypt(&self, passphrase: &str) -> crate::Result<EncryptedCredentials> {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut nonce_bytes = vec![0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = derive_key(passphrase, &salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| BurrowError::Decryption(e.to_string()))?;

        let plaintext = Zeroizing::new(
            serde_json::to_vec(&serde_json::json!({
                "api_key": self.api_key,
                "secret_api_key": self.secret_api_key,
            }))
            .map_err(|e| BurrowError::Decryption(e.to_string()))?,
        );

        let nonce_arr: [u8; NONCE_LEN] = nonce_bytes
            .clone()
            .try_into()
            .expect("nonce is always NONCE_LEN bytes");
        let nonce = Nonce::from(nonce_arr);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| BurrowError::Decryption(e.to_string()))?;

        Ok(EncryptedCredentials {
            salt,
            nonce: nonce_bytes,
            ciphertext,
        })
    }
}

/// The on-disk credential record: salt, nonce, and AEAD ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedCredentials {
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedCredentials {
    /// Decrypt back into a credential pair.
    ///
    /// Fails with `Decryption` when the record is malformed or the passphrase
    /// is wrong.
    pub fn decrypt(&self, passphrase: &str) -> crate::Result<CredentialPair> {
        let key = derive_key(passphrase, &self.salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| BurrowError::Decryption(e.to_string()))?;

        let nonce_arr: [u8; NONCE_LEN] = self
            .nonce
            .clone()
            .try_into()
            .map_err(|_| BurrowError::Decryption("invalid nonce length".to_string()))?;
        let nonce = Nonce::from(nonce_arr);
        let plaintext = Zeroizing::new(cipher.decrypt(&nonce, self.ciphertext.as_ref()).map_err(
            |_| BurrowError::Decryption("decryption failed (wrong passphrase?)".to_string()),
        )?);

        let fields: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|_| BurrowError::Decryption("malformed credential plaintext".to_string()))?;
        let api_key = fields
            .get("api_key")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| BurrowError::Decryption("missing api_key field".to_string()))?;
        let secret_api_key = fields
            .get("secret_api_key")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| BurrowError::Decryption("missing secret_api_key field".to_string()))?;

        CredentialPair::new(api_key, secret_api_key)
    }
}

/// Save an encrypted credential record to a JSON file.
pub fn save_credentials(path: &Path, record: &EncryptedCredentials) -> crate::Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| BurrowError::Decryption(e.to_string()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| file_error(path, e))?;
        }
    }
    std::fs::write(path, json).map_err(|e| file_error(path, e))?;
    tracing::debug!(path = %path.display(), "encrypted credentials saved");
    Ok(())
}

/// Load an encrypted credential record from a JSON file.
pub fn load_credentials(path: &Path) -> crate::Result<EncryptedCredentials> {
    let json = std::fs::read_to_string(path).map_err(|e| file_error(path, e))?;
    serde_json::from_str(&json)
        .map_err(|_| BurrowError::Decryption("malformed credential record".to_string()))
}

fn file_error(path: &Path, e: std::io::Error) -> BurrowError {
    BurrowError::InvalidConfig {
        field: "credentials.file".to_string(),
        reason: format!("{}: {e}", path.display()),
    }
}

/// Derive a 256-bit AES key from a passphrase using Argon2id.
fn derive_key(passphrase: &str, salt: &[u8]) -> crate::Result<[u8; 32]> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| BurrowError::Decryption(e.to_string()))?;
    Ok(key)
}

/// Shared credential state, injected into the gateway.
///
/// Read-mostly after the initial set. A concurrent `set` races with in-flight
/// calls using the old pair — those calls complete with whichever snapshot
/// they captured at dispatch time (last-writer-wins, no transactional
/// isolation).
#[derive(Default)]
pub struct CredentialStore {
    inner: RwLock<Option<CredentialPair>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held pair. In-flight calls keep their old snapshot.
    pub async fn set(&self, pair: CredentialPair) {
        *self.inner.write().await = Some(pair);
    }

    /// Clone the current pair for a single dispatch.
    pub async fn snapshot(&self) -> Option<CredentialPair> {
        self.inner.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
