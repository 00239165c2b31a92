/// Request authentication for Axum
///
/// Resolves `Authorization: Bearer <session token>` into an [`AuthContext`]:
///
/// 1. Header missing, not UTF-8, or not `Bearer <token>` → [`AuthError::MissingCredentials`]
/// 2. Token fails signature/issuer/expiry checks → [`AuthError::InvalidToken`]
/// 3. Token subject not found among staff or customers → [`AuthError::IdentityNotFound`]
///
/// The role in the context comes from the stored identity, not from the token,
/// so a role change takes effect on the next request.
///
/// The API server wires [`authenticate`] into a `from_fn_with_state` layer and
/// inserts the context into request extensions. Handlers take it as an extractor.
///
/// # Example
///
/// ```
/// use sellos_shared::auth::middleware::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("{} ({})", auth.email, auth.role.as_str())
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::identity::{Identity, IdentityVariant, Role};
use crate::store::{IdentityStore, StoreError};

/// Authenticated caller, added to request extensions by the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    pub identity_id: Uuid,
    pub role: Role,
    pub variant: IdentityVariant,
    pub email: String,
    pub name: String,
}

impl AuthContext {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id,
            role: identity.role,
            variant: identity.variant,
            email: identity.email.clone(),
            name: identity.name.clone(),
        }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable bearer token on the request
    #[error("Missing or malformed bearer token")]
    MissingCredentials,

    /// Token failed verification
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token is valid but its subject no longer exists
    #[error("Identity not found")]
    IdentityNotFound,

    /// Store lookup failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AuthError::IdentityNotFound => (StatusCode::NOT_FOUND, "not_found"),
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Authentication lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MissingCredentials),
    }
}

/// Resolves request headers into an authenticated context
///
/// # Errors
///
/// See the module docs for the mapping.
pub async fn authenticate<S>(
    store: &S,
    jwt_secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError>
where
    S: IdentityStore + ?Sized,
{
    let token = bearer_token(headers)?;

    let claims = validate_token(token, jwt_secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(other.to_string()),
    })?;

    let identity = store
        .find_identity_any(claims.sub)
        .await?
        .ok_or(AuthError::IdentityNotFound)?;

    tracing::debug!(
        identity_id = %identity.id,
        role = identity.role.as_str(),
        "Request authenticated"
    );

    Ok(AuthContext::from_identity(&identity))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}
