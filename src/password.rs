use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::AppError;

// Verified against when the username is unknown, so both login failures cost one Argon2 run.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"members-board-unused-credential", &salt)
        .map(|hash| hash.to_string())
        .ok()
});

/// hash_password
///
/// Salts and hashes `password` with Argon2id, returning the PHC string to store.
/// Runs on the blocking pool so the request task is not stalled by the KDF.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AppError::Hashing(e.to_string()))?
}

/// verify_password
///
/// Returns `Ok(false)` on a mismatch; `Err` only when the stored hash cannot be parsed or
/// the blocking task fails.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Hashing(e.to_string()))?
}

/// verify_dummy
///
/// Runs a full verification against a throwaway hash and discards the outcome. Used when
/// there is no stored hash to compare with.
pub async fn verify_dummy(password: String) -> Result<(), AppError> {
    tokio::task::spawn_blocking(move || {
        let hash = dummy_hash().ok_or_else(|| AppError::Hashing("dummy hash unavailable".into()))?;
        verify_blocking(&password, hash).map(|_| ())
    })
    .await
    .map_err(|e| AppError::Hashing(e.to_string()))?
}

/// The throwaway PHC string behind `verify_dummy`, built on first use.
pub fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH.as_deref()
}

fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AppError::Hashing(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Hashing(e.to_string())),
    }
}
