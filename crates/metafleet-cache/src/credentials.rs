use std::collections::HashMap;
use std::sync::Mutex;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub username: String,
    pub role: String,
    pub password_hash: String,
}

/// Username to credential map consulted by locally managed logins.
/// Reconciled against the metadata cache whenever a USERS event names a
/// user; never written from the login path.
#[derive(Debug, Default)]
pub struct CredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash and store the plaintext. Replaces any previous record for the
    /// username.
    pub fn install(&self, username: &str, role: &str, password: &str) -> Result<(), CredentialError> {
        let record = CredentialRecord {
            username: username.to_string(),
            role: role.to_string(),
            password_hash: hash_password(password)?,
        };
        self.records
            .lock()
            .unwrap()
            .insert(username.to_string(), record);
        Ok(())
    }

    pub fn remove(&self, username: &str) -> bool {
        self.records.lock().unwrap().remove(username).is_some()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.records.lock().unwrap().contains_key(username)
    }

    /// Check a plaintext password against the stored hash. Returns the
    /// user's role on success. Unknown usernames and mismatches are
    /// indistinguishable to the caller.
    pub fn verify(&self, username: &str, password: &str) -> Option<String> {
        let record = self.records.lock().unwrap().get(username).cloned()?;
        verify_password(password, &record.password_hash).then(|| record.role)
    }
}
