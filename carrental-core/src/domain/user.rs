//! User domain model

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A desk operator allowed past the login gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Hex SHA-256 of the password. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_digest: String,
}

impl User {
    /// Create an unsaved user from a plaintext password
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            id: 0,
            username: username.into(),
            password_digest: Self::digest_password(password),
        }
    }

    pub fn digest_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn verify_password(&self, password: &str) -> bool {
        Self::digest_password(password) == self.password_digest
    }
}
