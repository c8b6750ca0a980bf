//! User domain record and password digest helpers.
//!
//! Passwords are stored as a salted SHA-256 digest and never leave the
//! repository layer. This is storage hygiene only; authentication is not
//! provided by this crate.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Stable user identifier.
pub type UserId = Uuid;

/// User read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Salted password digest as persisted in `users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub salt: String,
    pub digest: String,
}

impl PasswordDigest {
    /// Derives a digest with a fresh random salt.
    pub fn derive(password: &str) -> Self {
        Self::derive_with_salt(password, Uuid::new_v4().simple().to_string())
    }

    pub fn derive_with_salt(password: &str, salt: String) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self { salt, digest }
    }

    /// Recomputes the digest for `password` and compares.
    pub fn matches(&self, password: &str) -> bool {
        Self::derive_with_salt(password, self.salt.clone()).digest == self.digest
    }
}
