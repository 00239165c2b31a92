/// Customer endpoints
///
/// # Endpoints
///
/// - `POST /api/customers/register` - Self-registration (public)
/// - `GET /api/customers` - List customers (admin)
/// - `PUT /api/customers/:id` - Update a customer (admin)
/// - `DELETE /api/customers/:id` - Delete a customer (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sellos_shared::{
    auth::password::{hash_password_async, validate_password_strength},
    mail::verification_email,
    models::identity::{Identity, IdentityVariant, UpdateIdentity},
    workflow::accounts::{self, RegisterCustomer},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Address must be at most 255 characters"))]
    pub address: Option<String>,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub customer_id: Uuid,
}

/// Customer update; absent fields are kept
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Address must be at most 255 characters"))]
    pub address: Option<String>,

    /// Rehashed before it is stored
    pub password: Option<String>,
}

/// Register a customer and email a verification link
///
/// If the verification email cannot be sent the new account is removed again,
/// so the customer can retry with the same address.
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: validation failed
/// - `500 Internal Server Error`: verification email could not be sent
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let (customer, token) = accounts::register_customer(
        &*state.store,
        RegisterCustomer {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
            address: req.address,
        },
    )
    .await?;

    let email = verification_email(
        state.frontend_url(),
        &customer.email,
        &customer.name,
        &token.token,
    );

    if let Err(e) = state.mailer.send(email).await {
        if let Err(cleanup) = state
            .store
            .delete_identity(IdentityVariant::Customer, customer.id)
            .await
        {
            tracing::error!(customer_id = %customer.id, error = %cleanup, "Failed to roll back registration");
        }
        return Err(e.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Check your email to verify your account.".to_string(),
            customer_id: customer.id,
        }),
    ))
}

/// List all customers
pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Identity>>> {
    let customers = state
        .store
        .list_identities(IdentityVariant::Customer, None)
        .await?;

    Ok(Json(customers))
}

/// Update a customer
///
/// # Errors
///
/// - `404 Not Found`: no such customer
/// - `409 Conflict`: new email already registered
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<Identity>> {
    req.validate()?;

    let password_hash = match req.password {
        Some(password) => {
            validate_password_strength(&password)
                .map_err(|msg| ApiError::invalid_field("password", msg))?;
            Some(hash_password_async(password).await?)
        }
        None => None,
    };

    let customer = state
        .store
        .update_identity(
            IdentityVariant::Customer,
            id,
            UpdateIdentity {
                name: req.name,
                email: req.email,
                phone: req.phone,
                address: req.address,
                password_hash,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

    tracing::info!(customer_id = %customer.id, "Customer updated");

    Ok(Json(customer))
}

/// Delete a customer
///
/// Orders referencing the customer are kept.
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state
        .store
        .delete_identity(IdentityVariant::Customer, id)
        .await?
    {
        return Err(ApiError::NotFound("Customer not found".to_string()));
    }

    tracing::info!(customer_id = %id, "Customer deleted");

    Ok(Json(MessageResponse::new("Customer deleted")))
}
