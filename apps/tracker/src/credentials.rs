//! At-rest encryption for the per-application credential field.
//!
//! Credentials are login secrets for external job portals that the user must be
//! able to read back, so a one-way hash is not an option. They are sealed with
//! AES-256-GCM under a key derived by Argon2id from `CREDENTIAL_SECRET` and a
//! per-install salt, and only `nonce || ciphertext` reaches the database.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, bail, Context, Result};
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::{rngs::OsRng, RngCore};

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Derives the 256-bit credential key with Argon2id (default parameters).
pub fn derive_key(secret: &str, salt: &[u8; SALT_LEN]) -> Result<[u8; KEY_LEN]> {
    let salt_string =
        SaltString::encode_b64(salt).map_err(|e| anyhow!("Cannot encode salt for Argon2: {e}"))?;

    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt_string)
        .map_err(|e| anyhow!("Cannot derive credential key: {e}"))?;
    let output = hash.hash.context("No hash output from Argon2")?;

    let bytes = output.as_bytes();
    if bytes.len() < KEY_LEN {
        bail!("Argon2 hash output too short");
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes[..KEY_LEN]);
    Ok(key)
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Seals and opens credential values. Cheap to clone.
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn from_key(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    pub fn from_secret(secret: &str, salt: &[u8; SALT_LEN]) -> Result<Self> {
        Ok(Self::from_key(&derive_key(secret, salt)?))
    }

    /// Returns `nonce || ciphertext`, with a fresh random nonce per call.
    pub fn seal(&self, plaintext: &str) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| anyhow!("Credential encryption failed: {e}"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<String> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            bail!("Sealed credential too short");
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| anyhow!("Credential decryption failed: {e}"))?;
        String::from_utf8(plaintext).context("Credential is not valid UTF-8")
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialCipher(..)")
    }
}
