/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/login` - Login and get a session token
/// - `POST /api/auth/verify-email` - Redeem an email verification token
/// - `POST /api/auth/request-reset` - Email a password reset link
/// - `POST /api/auth/reset/:token` - Redeem a reset token with a new password
/// - `PATCH /api/auth/password` - Change password (authenticated)

use crate::{
    app::AppState,
    error::ApiResult,
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};
use sellos_shared::{
    auth::middleware::AuthContext,
    mail::password_reset_email,
    models::identity::Role,
    workflow::accounts,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Public part of the logged-in identity
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,

    /// Session token (24h)
    pub token: String,

    pub role: Role,

    pub user: LoginUser,
}

/// Email verification request
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// Password reset request
#[derive(Debug, Deserialize, Validate)]
pub struct RequestResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// New password for a reset link
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Password change from the profile
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Login
///
/// Staff accounts are looked up first; customers only when no staff member
/// owns the email.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password
/// - `401 Unauthorized` with `needs_verification: true`: customer has not verified
/// - `422 Unprocessable Entity`: validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let success = accounts::login(&*state.store, state.jwt_secret(), &req.email, &req.password).await?;
    let identity = success.identity;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: success.token,
        role: identity.role,
        user: LoginUser {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            role: identity.role,
        },
    }))
}

/// Redeem an email verification token
///
/// # Errors
///
/// - `400 Bad Request`: token unknown, used or expired
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    accounts::verify_email(&*state.store, &req.token).await?;

    Ok(Json(MessageResponse::new(
        "Email verified successfully. You can now log in.",
    )))
}

/// Email a password reset link
///
/// Answers identically whether or not the email is registered. A delivery
/// failure is logged and not reported, for the same reason.
pub async fn request_reset(
    State(state): State<AppState>,
    Json(req): Json<RequestResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    if let Some((identity, token)) = accounts::request_password_reset(&*state.store, &req.email).await? {
        let email = password_reset_email(
            state.frontend_url(),
            &identity.email,
            &identity.display_name(),
            &token.token,
        );

        if let Err(e) = state.mailer.send(email).await {
            tracing::error!(identity_id = %identity.id, error = %e, "Failed to send reset email");
        }
    }

    Ok(Json(MessageResponse::new(
        "If the email is registered, a reset link has been sent",
    )))
}

/// Redeem a reset token and set the new password
///
/// # Errors
///
/// - `400 Bad Request`: token unknown, used or expired
/// - `422 Unprocessable Entity`: new password too weak
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    accounts::reset_password(&*state.store, &token, &req.new_password).await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// Change the caller's password
///
/// # Errors
///
/// - `400 Bad Request`: current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    accounts::change_password(
        &*state.store,
        auth.identity_id,
        auth.variant,
        &req.current_password,
        &req.new_password,
    )
    .await?;

    Ok(Json(MessageResponse::new("Password updated")))
}
