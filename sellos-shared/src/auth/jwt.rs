/// Session token generation and validation
///
/// Session tokens are stateless HS256 JWTs carrying the identity id and role.
/// They live for a fixed 24 hours and there is no server-side revocation list:
/// changing a password does not invalidate tokens already issued.
///
/// # Claims
///
/// - `sub`: identity id (staff or customer)
/// - `role`: `administrator`, `employee` or `customer`
/// - `iss`: always `"sellos-g"`
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use sellos_shared::auth::jwt::{create_token, validate_token, Claims};
/// use sellos_shared::models::identity::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity_id = Uuid::new_v4();
/// let claims = Claims::new(identity_id, Role::Customer);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, identity_id);
/// assert_eq!(validated.role, Role::Customer);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::identity::Role;

/// Issuer embedded in and required of every session token
pub const ISSUER: &str = "sellos-g";

/// Fixed session lifetime
pub fn session_lifetime() -> Duration {
    Duration::hours(24)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token (bad signature, malformed, not yet valid)
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - identity id
    pub sub: Uuid,

    /// Role of the identity at issuance
    pub role: Role,

    /// Issuer - always "sellos-g"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims expiring 24 hours from now
    pub fn new(identity_id: Uuid, role: Role) -> Self {
        Self::with_expiration(identity_id, role, session_lifetime())
    }

    /// Creates claims with a custom lifetime
    ///
    /// Only tests and tooling should need this; login always issues 24-hour tokens.
    /// A negative duration yields an already-expired token.
    pub fn with_expiration(identity_id: Uuid, role: Role, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: identity_id,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp().min(expiration.timestamp()),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Signs claims into a token using HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a 24-hour session token for an identity
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn issue_session_token(identity_id: Uuid, role: Role, secret: &str) -> Result<String, JwtError> {
    create_token(&Claims::new(identity_id, role), secret)
}

/// Validates a token and extracts its claims
///
/// Verifies signature, expiry (no leeway), not-before and issuer.
///
/// # Errors
///
/// - `JwtError::Expired` once `exp` has passed
/// - `JwtError::InvalidIssuer` for tokens from another issuer
/// - `JwtError::ValidationError` for anything else
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_session_lifetime_is_24_hours() {
        assert_eq!(session_lifetime(), Duration::hours(24));

        let claims = Claims::new(Uuid::new_v4(), Role::Administrator);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let identity_id = Uuid::new_v4();
        let token = issue_session_token(identity_id, Role::Employee, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, identity_id);
        assert_eq!(validated.role, Role::Employee);
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = issue_session_token(Uuid::new_v4(), Role::Customer, SECRET).unwrap();

        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_token_older_than_a_day() {
        // Issued 25 hours ago with the standard lifetime
        let issued = Utc::now() - Duration::hours(25);
        let mut claims = Claims::new(Uuid::new_v4(), Role::Customer);
        claims.iat = issued.timestamp();
        claims.nbf = issued.timestamp();
        claims.exp = (issued + session_lifetime()).timestamp();
        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_garbage_token() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }

    #[test]
    fn test_validate_foreign_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), Role::Customer);
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_custom_expiration() {
        let claims = Claims::with_expiration(Uuid::new_v4(), Role::Customer, Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500);
        assert!(time_left.num_seconds() <= 3600);
    }
}
