// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification (Argon2id, PHC strings).
//!
//! Both calls are CPU-heavy; async callers should run them on the blocking
//! pool.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Salt generation or hashing failed.
    #[error("password encoding failed: {0}")]
    Encoding(String),

    #[error("password does not match")]
    Mismatch,

    /// The stored hash could not be parsed.
    #[error("stored password hash is corrupt: {0}")]
    CorruptHash(String),
}

/// Hash a password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| CredentialError::Encoding(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash. The comparison is
/// constant-time.
pub fn verify_password(hash: &str, plaintext: &str) -> Result<(), CredentialError> {
    let parsed = PasswordHash::new(hash).map_err(|e| CredentialError::CorruptHash(e.to_string()))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(PasswordHashError::Password) => Err(CredentialError::Mismatch),
        Err(e) => Err(CredentialError::CorruptHash(e.to_string())),
    }
}
