//! Password hashing with argon2
//!
//! Hashes carry a per-hash random salt and are stored in PHC string format,
//! so verification needs nothing beyond the stored string itself.

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::OnceLock;

/// Hash a plaintext password with a freshly generated salt
pub fn hash(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// A well-formed hash that no password verifies against
///
/// Verified against when a credential check has no stored hash to compare
/// with, so that path costs the same hashing work as a real mismatch.
pub fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        let throwaway = format!("{:032x}", rand::random::<u128>());
        hash(&throwaway).expect("Failed to hash throwaway password")
    })
}

/// Verify a plaintext password against a stored PHC hash string
///
/// An unparseable stored hash counts as a failed verification rather than an
/// error; callers must not learn why a credential was rejected.
pub fn verify(plain: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
