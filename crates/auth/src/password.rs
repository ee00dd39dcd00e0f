//! Password hashing and verification
//!
//! Uses Argon2id with a configurable work factor. The plaintext is never
//! logged or returned; a wrong password is a normal `Ok(false)` outcome,
//! not an error.

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, Result};

/// Argon2 work factor
///
/// Defaults follow the `argon2` crate's recommended parameters. Raise
/// `memory_kib` and `iterations` together when tuning for stronger hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of iterations
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingParams {
    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AuthError::internal(format!("invalid argon2 params: {}", e)))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

/// Hash a password using Argon2id with the default work factor
///
/// Returns the hash in PHC format: `$argon2id$v=19$m=...,t=...,p=...$salt$hash`
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with(&HashingParams::default(), password)
}

/// Hash a password using Argon2id with an explicit work factor
pub fn hash_password_with(params: &HashingParams, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.argon2()?;

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::internal(format!("password hash failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash
///
/// The PHC string carries its own parameters, so hashes produced with any
/// work factor verify correctly. Comparison is constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::internal(format!("invalid password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::internal(format!(
            "password verification failed: {}",
            e
        ))),
    }
}
