//! Credential verification and password hashing.
//!
//! Argon2id with per-record salts; hashing and verification run under
//! `spawn_blocking` because they are intentionally CPU-expensive and would
//! stall the async runtime if run inline.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;
use crate::models::Identity;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// No identity with that email. Boundaries must render this exactly like
    /// [`CredentialError::BadCredentials`] to prevent account enumeration.
    #[error("Invalid credentials")]
    NotFound,

    /// May be surfaced distinctly, but only to the user themselves.
    #[error("Account is inactive")]
    Inactive,

    #[error("Invalid credentials")]
    BadCredentials,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Verifies email + password against the stored hash.
///
/// Email matching is case-insensitive; the comparison itself has no side
/// effects.
pub async fn verify(store: &Store, email: &str, password: &str) -> Result<Identity, CredentialError> {
    let user = store
        .find_user_by_email(email)
        .await
        .ok_or(CredentialError::NotFound)?;

    if !user.active {
        return Err(CredentialError::Inactive);
    }

    let matches = verify_password(user.password_hash.clone(), password.to_string())
        .await
        .map_err(|e| CredentialError::Internal(e.to_string()))?;

    if !matches {
        return Err(CredentialError::BadCredentials);
    }

    Ok(user)
}

/// Compares a plaintext password against a stored Argon2 hash on the
/// blocking pool.
pub async fn verify_password(hash: String, password: String) -> Result<bool> {
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| anyhow::anyhow!("Password verification task panicked: {e}"))?
}

/// Hashes a password with the configured Argon2id params on the blocking pool.
pub async fn hash_password(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password_sync(&password, &config))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))?
}

pub fn hash_password_sync(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generates the admin-issued PJ reset code (~11 chars, not guessable).
/// Only its hash ever touches the store; the plaintext is shown once.
#[must_use]
pub fn generate_reset_code() -> String {
    random_token::<8>()
}

/// Strong temporary password for user records created without one (~16 chars).
#[must_use]
pub fn generate_temp_password() -> String {
    random_token::<12>()
}

fn random_token<const N: usize>() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; N] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityKind;
    use std::collections::HashSet;

    fn fast_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    async fn store_with_user(email: &str, password: &str, active: bool) -> Store {
        let path = std::env::temp_dir().join(format!("painel-cred-{}.json", uuid::Uuid::new_v4()));
        let store = Store::open(path).await.unwrap();

        let user = Identity {
            id: "u1".to_string(),
            name: "Test".to_string(),
            email: email.to_string(),
            kind: IdentityKind::Pj,
            cpf: String::new(),
            active,
            admin: false,
            modules: HashSet::new(),
            department_ids: vec![],
            password_hash: hash_password(password.to_string(), fast_params())
                .await
                .unwrap(),
            reset_code_hash: None,
            reset_code_expires_at: None,
        };
        store.insert_user(user).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_verify_accepts_correct_password() {
        let store = store_with_user("user@example.com", "hunter22", true).await;
        let user = verify(&store, "user@example.com", "hunter22").await.unwrap();
        assert_eq!(user.id, "u1");
    }

    #[tokio::test]
    async fn test_verify_email_is_case_insensitive() {
        let store = store_with_user("user@example.com", "hunter22", true).await;
        assert!(verify(&store, "USER@EXAMPLE.COM", "hunter22").await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_password() {
        let store = store_with_user("user@example.com", "hunter22", true).await;
        let err = verify(&store, "user@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, CredentialError::BadCredentials));
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_email() {
        let store = store_with_user("user@example.com", "hunter22", true).await;
        let err = verify(&store, "ghost@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound));
    }

    #[tokio::test]
    async fn test_verify_rejects_inactive_even_with_good_password() {
        let store = store_with_user("user@example.com", "hunter22", false).await;
        let err = verify(&store, "user@example.com", "hunter22").await.unwrap_err();
        assert!(matches!(err, CredentialError::Inactive));
    }

    #[tokio::test]
    async fn test_enumeration_safe_messages_match() {
        // NotFound and BadCredentials must render identically.
        assert_eq!(
            CredentialError::NotFound.to_string(),
            CredentialError::BadCredentials.to_string()
        );
    }

    #[test]
    fn test_generated_secrets_are_unique() {
        assert_ne!(generate_reset_code(), generate_reset_code());
        assert!(generate_temp_password().len() >= 16);
    }
}
