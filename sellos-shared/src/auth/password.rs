/// Password hashing module using Argon2id
///
/// Every identity password (staff and customers alike) goes through this module.
/// Hashes are slow, salted and one-way; a fresh random salt is drawn on every call
/// to [`hash_password`], so rewriting the same password produces a different hash.
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
/// use sellos_shared::auth::password::{hash_password, password_matches};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password_123")?;
///
/// assert!(password_matches("super_secret_password_123", &hash));
/// assert!(!password_matches("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use std::sync::OnceLock;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// The blocking hash task did not complete
    #[error("Password task failed: {0}")]
    TaskFailed(String),
}

/// Hashes a password using Argon2id with the parameters above
///
/// Returns the PHC string (`$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`).
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Comparison is constant-time. Returns `Ok(false)` for a wrong password and an
/// error only when the stored hash itself cannot be used.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` for an unparseable hash and
/// `PasswordError::VerifyError` for any other verification failure.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the hash
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Credential check used by login and password change
///
/// Never fails: any internal error (corrupt hash, unsupported parameters) is
/// logged and treated as a mismatch.
pub fn password_matches(candidate: &str, hash: &str) -> bool {
    match verify_password(candidate, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Password verification failed, treating as mismatch");
            false
        }
    }
}

/// Hashes on the blocking pool so the async reactor keeps serving other requests
///
/// # Errors
///
/// Returns the hashing error, or `PasswordError::TaskFailed` if the blocking task panicked.
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// Async counterpart of [`password_matches`]; a failed blocking task counts as a mismatch
pub async fn password_matches_async(candidate: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || password_matches(&candidate, &hash)).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Password verification task failed");
            false
        }
    }
}

/// Hash of a throwaway password, checked on logins for unknown emails
static PLACEHOLDER_HASH: OnceLock<Option<String>> = OnceLock::new();

fn placeholder_hash() -> Option<&'static str> {
    PLACEHOLDER_HASH
        .get_or_init(|| hash_password("placeholder-for-unknown-accounts").ok())
        .as_deref()
}

/// Runs one Argon2 verification whose result is discarded
///
/// Used when the login email is unknown; costs the same as a wrong password.
pub async fn spend_verification_work(candidate: String) {
    let result = tokio::task::spawn_blocking(move || {
        if let Some(hash) = placeholder_hash() {
            let _ = verify_password(&candidate, hash);
        }
    })
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, "Placeholder verification task failed");
    }
}

/// Validates password strength
///
/// The storefront only requires a minimum length; existing customers
/// registered with passwords of any composition.
///
/// # Example
///
/// ```
/// use sellos_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("longenough").is_ok());
/// assert!(validate_password_strength("short").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password.trim().is_empty() {
        return Err("Password must not be blank".to_string());
    }

    Ok(())
}
