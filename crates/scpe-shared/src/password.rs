//! Salted password hashing.
//!
//! Credentials are stored as Argon2id PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`). The cost parameters
//! travel inside the string, so verification never needs to know which
//! parameters were used when the hash was produced.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::constants::SALT_SIZE;
use crate::error::PasswordError;

/// Hash a plaintext password with the default Argon2id cost parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, Params::default())
}

/// Hash a plaintext password with explicit cost parameters.
pub fn hash_password_with(password: &str, params: Params) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    let mut salt_bytes = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Check a plaintext password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only when `phc` itself cannot
/// be parsed.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(phc).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Whether `s` parses as a PHC string.
pub fn is_phc_string(s: &str) -> bool {
    PasswordHash::new(s).is_ok()
}

/// Cheapest parameters Argon2 accepts. Only meant for tests and fixtures.
pub fn insecure_test_params() -> Params {
    Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
        .unwrap_or_default()
}
