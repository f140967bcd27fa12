use anyhow::Context;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Hashes a signup password into an Argon2id PHC string with a fresh salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "could not hash signup password");
            anyhow::anyhow!("{e}")
        })
        .context("hashing password")
}

/// `Ok(false)` on mismatch. A stored hash that is not a readable PHC string
/// (or names an algorithm we cannot run) is an error, not a mismatch.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let unreadable = |e: password_hash::Error| {
        error!(error = %e, "stored password hash is unreadable");
        anyhow::anyhow!("{e}").context("verifying password")
    };
    let parsed = PasswordHash::new(stored).map_err(unreadable)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(unreadable(e)),
    }
}
