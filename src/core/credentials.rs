// Password hashing and verification-code comparison

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use secrecy::{ExposeSecret, Secret};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::core::errors::InboxError;
use crate::core::models::PasswordHash;

/// Plaintext password wrapper with memory protection
///
/// Uses `secrecy::Secret` so the password never reaches logs via `Debug`.
pub struct Password(Secret<String>);

impl Password {
    pub fn new(password: &str) -> Self {
        Self(Secret::new(password.to_string()))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn char_len(&self) -> usize {
        self.expose_secret().chars().count()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("value", &"<REDACTED>")
            .finish()
    }
}

/// Hash a password into an argon2id PHC string with a fresh salt
pub fn hash_password(password: &Password) -> Result<PasswordHash, InboxError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| InboxError::CredentialError(e.to_string()))?;
    Ok(PasswordHash::from_phc(phc.to_string()))
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &Password, hash: &PasswordHash) -> Result<bool, InboxError> {
    let parsed = PhcHash::new(hash.as_str())
        .map_err(|e| InboxError::CredentialError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .is_ok())
}

/// Hash on the blocking pool so argon2 never stalls a runtime worker
pub async fn hash_password_blocking(password: Password) -> Result<PasswordHash, InboxError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| InboxError::CredentialError(format!("Hashing task failed: {}", e)))?
}

pub async fn verify_password_blocking(
    password: Password,
    hash: PasswordHash,
) -> Result<bool, InboxError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| InboxError::CredentialError(format!("Verification task failed: {}", e)))?
}

/// Exact string equality without early exit on the first differing byte
pub fn codes_match(submitted: &str, expected: &str) -> bool {
    submitted.len() == expected.len() && bool::from(submitted.as_bytes().ct_eq(expected.as_bytes()))
}
