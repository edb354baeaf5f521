/// Password hashing module using Argon2id
///
/// Every user gets a random salt at registration (and again on each password
/// change). The salt is stored next to the hash, and the hash is derived from
/// exactly that salt, so `hash_password` is deterministic for a given
/// `(salt, password)` pair.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use tasklist_shared::auth::password::{generate_salt, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let salt = generate_salt();
/// let hash = hash_password(&salt, "super_secret_password_123")?;
///
/// assert!(verify_password(&salt, "super_secret_password_123", &hash)?);
/// assert!(!verify_password(&salt, "wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Salt is not valid B64 of an acceptable length
    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Generates a fresh random salt
///
/// 16 bytes from the OS CSPRNG, B64-encoded (no padding).
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with the given salt
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash):
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::InvalidSalt` if `salt` was not produced by
/// [`generate_salt`] (or is otherwise not valid B64), and
/// `PasswordError::HashError` if hashing fails.
pub fn hash_password(salt: &str, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::from_b64(salt).map_err(|e| PasswordError::InvalidSalt(e.to_string()))?;

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored salt and hash
///
/// The comparison is constant-time. A hash that was derived from a different
/// salt than `salt` never verifies.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `expected_hash` is not a PHC
/// string, and `PasswordError::VerifyError` for any other failure.
pub fn verify_password(
    salt: &str,
    password: &str,
    expected_hash: &str,
) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(expected_hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.salt.map(|s| s.as_str()) != Some(salt) {
        return Ok(false);
    }

    // Parameters are embedded in the hash
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}
