//! Password hashing with Argon2id.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};

use haven_core::error::AppError;
use haven_core::result::AppResult;

/// Hashes and verifies passwords using Argon2id with default parameters.
///
/// Every hash carries its own random salt inside the PHC string, so equal
/// passwords still produce distinct hashes.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Produces a PHC-formatted Argon2id hash with a fresh salt.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Could not hash password: {e}")))
    }

    /// Checks a plaintext candidate against a stored PHC hash.
    ///
    /// A wrong password is `Ok(false)`; only a malformed stored hash or a
    /// backend failure is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Stored password hash is malformed: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Could not verify password: {e}"))),
        }
    }
}
