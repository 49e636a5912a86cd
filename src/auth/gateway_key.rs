// Gateway key hashing and constant-time comparison

use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

/// Shared key presented by the auth gateway on owner-scoped requests
///
/// Uses `secrecy::Secret` to prevent accidental logging of key material.
pub struct GatewayKey(Secret<String>);

impl GatewayKey {
    pub fn new(key: &str) -> Self {
        Self(Secret::new(key.to_string()))
    }

    /// SHA-256 hex digest of the key
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Compare against the configured digest without early exit
    pub fn matches_hash(&self, expected_hash: &str) -> bool {
        let presented = self.hash();
        presented.len() == expected_hash.len()
            && bool::from(presented.as_bytes().ct_eq(expected_hash.as_bytes()))
    }
}

impl fmt::Debug for GatewayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayKey")
            .field("key", &"<REDACTED>")
            .finish()
    }
}

impl fmt::Display for GatewayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<REDACTED>")
    }
}
