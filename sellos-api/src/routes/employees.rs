/// Employee endpoints (admin)
///
/// # Endpoints
///
/// - `POST /api/employees` - Create an employee
/// - `GET /api/employees` - List employees
/// - `PUT /api/employees/:id` - Update an employee
/// - `DELETE /api/employees/:id` - Delete an employee

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
    mail::employee_welcome_email,
    models::identity::{Identity, IdentityVariant, Role, UpdateIdentity},
    workflow::accounts::{self, NewStaffMember},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Employee creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 30, message = "National id must be at most 30 characters"))]
    pub national_id: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Employee update; absent fields are kept
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 30, message = "National id must be at most 30 characters"))]
    pub national_id: Option<String>,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,
}

async fn require_employee(state: &AppState, id: Uuid) -> ApiResult<Identity> {
    state
        .store
        .find_identity(IdentityVariant::Staff, id)
        .await?
        .filter(|staff| staff.role == Role::Employee)
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))
}

/// Create an employee and send a welcome email in the background
///
/// # Errors
///
/// - `409 Conflict`: email or national id already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_employee(
    State(state): State<AppState>,
    Json(req): Json<CreateEmployeeRequest>,
) -> ApiResult<(StatusCode, Json<Identity>)> {
    req.validate()?;

    let employee = accounts::create_staff_member(
        &*state.store,
        NewStaffMember {
            role: Role::Employee,
            name: req.name,
            last_name: req.last_name,
            national_id: req.national_id,
            phone: req.phone,
            email: req.email,
            password: req.password,
        },
    )
    .await?;

    let email = employee_welcome_email(state.frontend_url(), &employee.email, &employee.display_name());
    let mailer = state.mailer.clone();
    let employee_id = employee.id;
    tokio::spawn(async move {
        if let Err(e) = mailer.send(email).await {
            tracing::warn!(employee_id = %employee_id, error = %e, "Failed to send welcome email");
        }
    });

    Ok((StatusCode::CREATED, Json(employee)))
}

/// List employees
///
/// Administrators are staff too but are not listed here.
pub async fn list_employees(State(state): State<AppState>) -> ApiResult<Json<Vec<Identity>>> {
    let employees = state
        .store
        .list_identities(IdentityVariant::Staff, Some(Role::Employee))
        .await?;

    Ok(Json(employees))
}

/// Update an employee
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> ApiResult<Json<Identity>> {
    req.validate()?;
    require_employee(&state, id).await?;

    let password_hash = match req.password {
        Some(password) => {
            validate_password_strength(&password)
                .map_err(|msg| ApiError::invalid_field("password", msg))?;
            Some(hash_password_async(password).await?)
        }
        None => None,
    };

    let employee = state
        .store
        .update_identity(
            IdentityVariant::Staff,
            id,
            UpdateIdentity {
                name: req.name,
                last_name: req.last_name,
                national_id: req.national_id,
                phone: req.phone,
                email: req.email,
                password_hash,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    tracing::info!(employee_id = %employee.id, "Employee updated");

    Ok(Json(employee))
}

/// Delete an employee
///
/// Orders assigned to the employee keep the dangling reference.
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_employee(&state, id).await?;

    state.store.delete_identity(IdentityVariant::Staff, id).await?;

    tracing::info!(employee_id = %id, "Employee deleted");

    Ok(Json(MessageResponse::new("Employee deleted")))
}
