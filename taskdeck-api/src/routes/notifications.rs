/// Notification endpoints
///
/// # Endpoints
///
/// - `GET /v1/notifications` - List the caller's notifications
/// - `GET /v1/notifications/unread_count` - Count the caller's unread notifications
/// - `PUT /v1/notifications/:id/read` - Mark one of the caller's notifications read
/// - `POST /v1/notifications/send` - Explicitly send a notification to a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::{
        notification::{CreateNotification, Notification},
        task::Task,
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Unread notification count response
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    /// Number of unread notifications
    pub count: i64,
}

/// Explicit notification send request
#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    /// Recipient user ID
    pub recipient_id: Uuid,

    /// Task the notification is about
    pub task_id: Uuid,

    /// Message text
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
}

/// Lists the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = Notification::list_by_recipient(&state.db, auth.user_id).await?;

    Ok(Json(notifications))
}

/// Counts the caller's unread notifications
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let count = Notification::count_unread(&state.db, auth.user_id).await?;

    Ok(Json(UnreadCountResponse { count }))
}

/// Marks a notification as read
///
/// Scoped to the caller's own notifications. Idempotent: repeating the call
/// on an already-read notification succeeds again.
///
/// # Errors
///
/// - `404 Not Found`: No such notification for this user
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let marked = Notification::mark_read(&state.db, id, auth.user_id).await?;

    if !marked {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Explicitly sends a notification to another user
///
/// The record is persisted first; if the recipient has a live WebSocket
/// connection the event is also pushed, best-effort. Push failures never
/// affect the response.
///
/// # Errors
///
/// - `400 Bad Request`: Recipient is the caller (no self-notification)
/// - `404 Not Found`: Referenced task does not exist
/// - `422 Unprocessable Entity`: Unknown recipient or empty message
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SendNotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    req.validate()?;

    if req.recipient_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot send a notification to yourself".to_string(),
        ));
    }

    if !User::exists(&state.db, req.recipient_id).await? {
        return Err(ApiError::ValidationError(vec![
            crate::error::ValidationErrorDetail {
                field: "recipient_id".to_string(),
                message: "Recipient does not exist".to_string(),
            },
        ]));
    }

    if Task::find_by_id(&state.db, req.task_id).await?.is_none() {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    // Durable write first, then best-effort push
    let notification = Notification::create(
        &state.db,
        CreateNotification {
            recipient_id: req.recipient_id,
            task_id: req.task_id,
            message: req.message,
        },
    )
    .await?;

    state.dispatcher.dispatch(&notification);

    Ok((StatusCode::CREATED, Json(notification)))
}
