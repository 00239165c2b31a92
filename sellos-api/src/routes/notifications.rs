/// Notification endpoints (admin)
///
/// # Endpoints
///
/// - `GET /api/notifications` - All notifications, newest first
/// - `GET /api/notifications/unread` - Unread notifications
/// - `PATCH /api/notifications/:id/read` - Mark one as read
/// - `PATCH /api/notifications/read-all` - Mark all as read
/// - `DELETE /api/notifications/:id` - Delete one

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Json,
};
use sellos_shared::models::notification::Notification;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of marking everything read
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.store.list_notifications(false).await?))
}

pub async fn list_unread_notifications(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(state.store.list_notifications(true).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = state
        .store
        .mark_notification_read(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

pub async fn mark_all_read(State(state): State<AppState>) -> ApiResult<Json<MarkAllReadResponse>> {
    let updated = state.store.mark_all_notifications_read().await?;

    tracing::debug!(updated, "Notifications marked read");

    Ok(Json(MarkAllReadResponse {
        message: "All notifications marked as read".to_string(),
        updated,
    }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.store.delete_notification(id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(MessageResponse::new("Notification deleted")))
}
