/// Single-use action tokens (email verification and password reset)
///
/// Unlike session tokens these are opaque random strings with server-side state,
/// so they can be revoked by clearing the stored digest.
///
/// # Format
///
/// - 32 bytes from the OS RNG, hex-encoded: 64 characters
/// - Only `SHA-256(token)` (hex) is persisted, next to an absolute expiry
/// - Expiry is one hour after issuance
///
/// Redemption is done by the store in a single conditional write that matches
/// the digest and `expires_at > now`, applies the authorized change, and clears
/// the token. See `store::IdentityStore::redeem_verification` and
/// `store::IdentityStore::redeem_password_reset`.
///
/// # Example
///
/// ```
/// use sellos_shared::auth::action_token::{hash_action_token, ActionToken};
///
/// let issued = ActionToken::generate();
/// assert_eq!(issued.token.len(), 64);
/// assert_eq!(issued.token_hash, hash_action_token(&issued.token));
/// assert!(!issued.is_expired());
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Random bytes per token
pub const ACTION_TOKEN_BYTES: usize = 32;

/// Lifetime of verification and reset tokens
pub fn action_token_lifetime() -> Duration {
    Duration::hours(1)
}

/// A freshly issued action token
///
/// `token` goes to the user by email and is never stored. `token_hash` and
/// `expires_at` go to the identity row.
#[derive(Debug, Clone)]
pub struct ActionToken {
    /// Plaintext token (hex)
    pub token: String,

    /// SHA-256 digest of `token` (hex)
    pub token_hash: String,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl ActionToken {
    /// Generates a token valid for one hour
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generates a token as if issued at `issued_at`
    pub fn generate_at(issued_at: DateTime<Utc>) -> Self {
        let mut bytes = [0u8; ACTION_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let token_hash = hash_action_token(&token);

        Self {
            token,
            token_hash,
            expires_at: issued_at + action_token_lifetime(),
        }
    }

    /// Checks if the token is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Computes the stored digest for a presented token
pub fn hash_action_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check before touching the store
///
/// Anything that is not 64 hex characters can never match a stored digest.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == ACTION_TOKEN_BYTES * 2 && token.chars().all(|c| c.is_ascii_hexdigit())
}
