/// Credential flows: login, registration, verification, password reset/change
///
/// These functions own every decision about credentials; HTTP handlers only
/// decode requests, call in here, and send whatever email the outcome asks for.
///
/// # Login
///
/// ```text
/// staff by email ──found──► check password ──────────────► token
///      │
///   missing
///      ▼
/// customer by email ──found──► check password ──► verified? ──► token
/// ```
///
/// A wrong password or unknown email yields the same `InvalidCredentials`. A
/// customer with the right password but an unverified email gets
/// `NotVerified`, which the API reports with a `needs_verification` flag.
///
/// # Example
///
/// ```
/// use sellos_shared::store::memory::MemoryStore;
/// use sellos_shared::workflow::accounts::{login, AccountError};
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let result = login(&store, "test-secret-key-at-least-32-bytes-long", "nobody@x.com", "whatever").await;
/// assert!(matches!(result, Err(AccountError::InvalidCredentials)));
/// # }
/// ```

use chrono::Utc;
use uuid::Uuid;

use crate::auth::action_token::{hash_action_token, is_well_formed, ActionToken};
use crate::auth::jwt::{issue_session_token, JwtError};
use crate::auth::password::{
    hash_password_async, password_matches_async, spend_verification_work,
    validate_password_strength, PasswordError,
};
use crate::models::identity::{CreateIdentity, Identity, IdentityVariant, Role};
use crate::store::{IdentityStore, StoreError};

/// Error type for credential flows
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Correct password but the customer never verified their email
    #[error("Your account has not been verified. Check your email.")]
    NotVerified,

    /// Action token unknown, already used, or expired
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Password change with a wrong current password
    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    /// New password rejected by the strength check
    #[error("{0}")]
    WeakPassword(String),

    /// Identity does not exist
    #[error("Identity not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// 24-hour session token
    pub token: String,

    /// The authenticated identity
    pub identity: Identity,
}

/// Self-registration input
#[derive(Debug, Clone)]
pub struct RegisterCustomer {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Staff creation input (employees created by administrators)
#[derive(Debug, Clone)]
pub struct NewStaffMember {
    pub role: Role,
    pub name: String,
    pub last_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
}

/// Resolves a login email, staff first
///
/// If a staff member owns the email, customers are never consulted.
pub async fn find_login_identity<S>(store: &S, email: &str) -> Result<Option<Identity>, StoreError>
where
    S: IdentityStore + ?Sized,
{
    if let Some(staff) = store.find_identity_by_email(IdentityVariant::Staff, email).await? {
        return Ok(Some(staff));
    }
    store.find_identity_by_email(IdentityVariant::Customer, email).await
}

/// Checks a candidate password against an identity
pub async fn verify_password(identity: &Identity, candidate: &str) -> bool {
    password_matches_async(candidate.to_string(), identity.password_hash.clone()).await
}

/// Hashes and stores a new password
///
/// Session tokens issued earlier stay valid until they expire.
pub async fn set_password<S>(store: &S, identity: &Identity, plaintext: &str) -> Result<(), AccountError>
where
    S: IdentityStore + ?Sized,
{
    validate_password_strength(plaintext).map_err(AccountError::WeakPassword)?;
    let hash = hash_password_async(plaintext.to_string()).await?;

    if store.set_password_hash(identity.variant, identity.id, &hash).await? {
        Ok(())
    } else {
        Err(AccountError::NotFound)
    }
}

/// Verifies credentials and issues a session token
pub async fn login<S>(
    store: &S,
    jwt_secret: &str,
    email: &str,
    password: &str,
) -> Result<LoginSuccess, AccountError>
where
    S: IdentityStore + ?Sized,
{
    let Some(identity) = find_login_identity(store, email).await? else {
        spend_verification_work(password.to_string()).await;
        tracing::debug!("Login for unknown email");
        return Err(AccountError::InvalidCredentials);
    };

    if !verify_password(&identity, password).await {
        tracing::debug!(identity_id = %identity.id, "Login with wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    if identity.variant == IdentityVariant::Customer && !identity.verified {
        tracing::debug!(identity_id = %identity.id, "Login refused for unverified customer");
        return Err(AccountError::NotVerified);
    }

    let token = issue_session_token(identity.id, identity.role, jwt_secret)?;

    tracing::info!(
        identity_id = %identity.id,
        role = identity.role.as_str(),
        "Login succeeded"
    );

    Ok(LoginSuccess { token, identity })
}

/// Creates an unverified customer with a pending verification token
///
/// Returns the plaintext token so the caller can email it.
pub async fn register_customer<S>(
    store: &S,
    data: RegisterCustomer,
) -> Result<(Identity, ActionToken), AccountError>
where
    S: IdentityStore + ?Sized,
{
    validate_password_strength(&data.password).map_err(AccountError::WeakPassword)?;

    let password_hash = hash_password_async(data.password).await?;
    let verification = ActionToken::generate();

    let customer = store
        .create_identity(CreateIdentity {
            role: Role::Customer,
            name: data.name,
            last_name: None,
            national_id: None,
            phone: data.phone,
            address: data.address,
            email: data.email,
            password_hash,
            verified: false,
            verification: Some((verification.token_hash.clone(), verification.expires_at)),
        })
        .await?;

    tracing::info!(customer_id = %customer.id, "Customer registered");

    Ok((customer, verification))
}

/// Creates a staff identity with a hashed password
pub async fn create_staff_member<S>(store: &S, data: NewStaffMember) -> Result<Identity, AccountError>
where
    S: IdentityStore + ?Sized,
{
    validate_password_strength(&data.password).map_err(AccountError::WeakPassword)?;

    let password_hash = hash_password_async(data.password).await?;
    let role = if data.role.is_staff() { data.role } else { Role::Employee };

    let staff = store
        .create_identity(CreateIdentity {
            role,
            name: data.name,
            last_name: data.last_name,
            national_id: data.national_id,
            phone: data.phone,
            address: None,
            email: data.email,
            password_hash,
            verified: true,
            verification: None,
        })
        .await?;

    tracing::info!(staff_id = %staff.id, role = role.as_str(), "Staff member created");

    Ok(staff)
}

/// Redeems an email verification token
pub async fn verify_email<S>(store: &S, token: &str) -> Result<Identity, AccountError>
where
    S: IdentityStore + ?Sized,
{
    if !is_well_formed(token) {
        return Err(AccountError::InvalidToken);
    }

    let customer = store
        .redeem_verification(&hash_action_token(token), Utc::now())
        .await?
        .ok_or(AccountError::InvalidToken)?;

    tracing::info!(customer_id = %customer.id, "Email verified");

    Ok(customer)
}

/// Issues a reset token if the email belongs to someone
///
/// `Ok(None)` for unknown emails; the API answers identically either way.
pub async fn request_password_reset<S>(
    store: &S,
    email: &str,
) -> Result<Option<(Identity, ActionToken)>, AccountError>
where
    S: IdentityStore + ?Sized,
{
    let Some(identity) = find_login_identity(store, email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(None);
    };

    let reset = ActionToken::generate();
    store
        .set_reset_token(identity.variant, identity.id, &reset.token_hash, reset.expires_at)
        .await?;

    tracing::info!(identity_id = %identity.id, "Password reset token issued");

    Ok(Some((identity, reset)))
}

/// Redeems a reset token, setting the new password in the same write
pub async fn reset_password<S>(
    store: &S,
    token: &str,
    new_password: &str,
) -> Result<Identity, AccountError>
where
    S: IdentityStore + ?Sized,
{
    if !is_well_formed(token) {
        return Err(AccountError::InvalidToken);
    }
    validate_password_strength(new_password).map_err(AccountError::WeakPassword)?;

    let new_hash = hash_password_async(new_password.to_string()).await?;

    let identity = store
        .redeem_password_reset(&hash_action_token(token), &new_hash, Utc::now())
        .await?
        .ok_or(AccountError::InvalidToken)?;

    tracing::info!(identity_id = %identity.id, "Password reset");

    Ok(identity)
}

/// Changes the caller's password after checking the current one
pub async fn change_password<S>(
    store: &S,
    identity_id: Uuid,
    variant: IdentityVariant,
    current_password: &str,
    new_password: &str,
) -> Result<(), AccountError>
where
    S: IdentityStore + ?Sized,
{
    let identity = store
        .find_identity(variant, identity_id)
        .await?
        .ok_or(AccountError::NotFound)?;

    if !verify_password(&identity, current_password).await {
        return Err(AccountError::IncorrectCurrentPassword);
    }

    set_password(store, &identity, new_password).await?;

    tracing::info!(identity_id = %identity.id, "Password changed");

    Ok(())
}
