/// Order endpoints
///
/// # Endpoints
///
/// - `POST /api/orders` - Create an order (admin)
/// - `GET /api/orders` - All orders (admin)
/// - `GET /api/orders/assigned` - Orders assigned to the caller (staff)
/// - `GET /api/orders/mine` - The caller's own orders (customer)
/// - `GET /api/orders/:id` - Order detail (admin, assignee or owning customer)
/// - `PUT /api/orders/:id` - Full update (admin)
/// - `PATCH /api/orders/:id/status` - Status change (assigned staff only)
/// - `DELETE /api/orders/:id` - Delete (admin)
///
/// Pricing, validation and ownership rules live in
/// [`sellos_shared::workflow::orders::OrderWorkflow`]; these handlers decode
/// requests and pick the listing scope.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{nullable, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use sellos_shared::{
    auth::middleware::AuthContext,
    models::order::{OrderFilter, OrderStatus, OrderView},
    workflow::orders::{CreateOrder, LineRequest, OrderWorkflow, UpdateOrder},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Order creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,

    pub assigned_staff_id: Option<Uuid>,

    /// Empty lists and non-positive quantities are rejected with 400
    #[serde(default)]
    pub line_items: Vec<LineRequest>,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub staff_note: Option<String>,

    pub delivery_date: Option<NaiveDate>,
}

/// Full order update; absent fields are kept
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub customer_id: Option<Uuid>,

    /// `null` clears the assignment
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_staff_id: Option<Option<Uuid>>,

    /// Replaces and re-prices the lines when non-empty
    pub line_items: Option<Vec<LineRequest>>,

    pub status: Option<String>,

    /// `null` clears the note
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub staff_note: Option<Option<String>>,

    /// `null` clears the delivery date
    #[serde(default, deserialize_with = "nullable")]
    pub delivery_date: Option<Option<NaiveDate>>,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn parse_status(raw: &str) -> ApiResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(ApiError::BadRequest)
}

/// Create an order
///
/// Each line is priced at the product's effective price at this moment.
///
/// # Errors
///
/// - `400 Bad Request`: unknown customer, employee or product; empty lines;
///   quantity below 1. Nothing is written.
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    req.validate()?;

    let order = OrderWorkflow::new(&*state.store)
        .create(
            CreateOrder {
                customer_id: req.customer_id,
                assigned_staff_id: req.assigned_staff_id,
                line_items: req.line_items,
                staff_note: req.staff_note,
                delivery_date: req.delivery_date,
            },
            Some(auth.identity_id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// All orders, newest first
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderView>>> {
    let orders = OrderWorkflow::new(&*state.store).list(OrderFilter::All).await?;
    Ok(Json(orders))
}

/// Orders assigned to the calling staff member, newest first
pub async fn list_assigned_orders(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<OrderView>>> {
    let orders = OrderWorkflow::new(&*state.store)
        .list(OrderFilter::AssignedTo(auth.identity_id))
        .await?;
    Ok(Json(orders))
}

/// The calling customer's orders, newest first
pub async fn list_my_orders(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<OrderView>>> {
    let orders = OrderWorkflow::new(&*state.store)
        .list(OrderFilter::Customer(auth.identity_id))
        .await?;
    Ok(Json(orders))
}

/// Order detail
///
/// # Errors
///
/// - `403 Forbidden`: caller is neither an administrator, the assignee nor the customer
/// - `404 Not Found`: no such order
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderView>> {
    let order = OrderWorkflow::new(&*state.store).get(&auth, id).await?;
    Ok(Json(order))
}

/// Full update
///
/// # Errors
///
/// - `400 Bad Request`: invalid status, unknown customer, employee or product
/// - `404 Not Found`: no such order
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> ApiResult<Json<OrderView>> {
    req.validate()?;

    let status = req.status.as_deref().map(parse_status).transpose()?;

    let order = OrderWorkflow::new(&*state.store)
        .update(
            id,
            UpdateOrder {
                customer_id: req.customer_id,
                assigned_staff_id: req.assigned_staff_id,
                line_items: req.line_items,
                status,
                staff_note: req.staff_note,
                delivery_date: req.delivery_date,
            },
        )
        .await?;

    Ok(Json(order))
}

/// Status change by the assigned staff member
///
/// No transition graph is enforced; any of the four statuses may follow any other.
///
/// # Errors
///
/// - `400 Bad Request`: unknown status
/// - `403 Forbidden`: caller is not the assignee
/// - `404 Not Found`: no such order
pub async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<OrderView>> {
    let status = parse_status(&req.status)?;

    let order = OrderWorkflow::new(&*state.store)
        .update_status(&auth, id, status)
        .await?;

    Ok(Json(order))
}

/// Delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    OrderWorkflow::new(&*state.store).delete(id).await?;
    Ok(Json(MessageResponse::new("Order deleted")))
}
