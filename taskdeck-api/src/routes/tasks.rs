/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List all tasks
/// - `POST   /v1/tasks` - Create a task (creator = caller)
/// - `GET    /v1/tasks/mine?type=assigned|created|all` - The caller's tasks
/// - `GET    /v1/tasks/overdue` - The caller's overdue tasks
/// - `GET    /v1/tasks/search?q=term` - Substring search over the caller's tasks
/// - `GET    /v1/tasks/filter?status&priority&due&assignee_id` - Filtered listing
/// - `GET    /v1/tasks/status/:status` - All tasks in a status
/// - `GET    /v1/tasks/:id` - Task detail
/// - `PUT    /v1/tasks/:id` - Update (creator or assignee only)
/// - `DELETE /v1/tasks/:id` - Delete (creator only)
///
/// Create and update run the notification rules as a side effect: the
/// notification row is persisted before the response goes out, and the
/// real-time push is fire-and-forget.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    notify,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    auth::middleware::AuthContext,
    models::{
        task::{
            CreateTask, Task, TaskFilter, TaskOwnership, TaskPriority, TaskStatus, TaskWithUsers,
            UpdateTask,
        },
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Task creation request
///
/// The creator is always the authenticated caller; it cannot be set from the
/// request body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    /// Optional description
    #[validate(length(min = 5, message = "Description must be at least 5 characters"))]
    pub description: Option<String>,

    /// Initial status (defaults to `todo`)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to `medium`)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,

    /// Optional initial assignee
    pub assignee_id: Option<Uuid>,
}

/// Query parameters for `GET /v1/tasks/mine`
#[derive(Debug, Deserialize)]
pub struct MyTasksQuery {
    /// Relationship filter: assigned, created, or all (default)
    #[serde(default, rename = "type")]
    pub ownership: TaskOwnership,
}

/// Query parameters for `GET /v1/tasks/search`
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search term
    pub q: Option<String>,
}

/// Lists all tasks, newest first
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskWithUsers>>> {
    let tasks = Task::list_all(&state.db).await?;

    Ok(Json(tasks))
}

/// Lists the caller's tasks by relationship
pub async fn list_my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MyTasksQuery>,
) -> ApiResult<Json<Vec<TaskWithUsers>>> {
    let tasks = Task::list_by_user(&state.db, auth.user_id, query.ownership).await?;

    Ok(Json(tasks))
}

/// Lists the caller's overdue tasks
///
/// Overdue: due date strictly before the start of the current day and status
/// not completed.
pub async fn list_overdue_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskWithUsers>>> {
    let tasks = Task::list_overdue(&state.db, auth.user_id).await?;

    Ok(Json(tasks))
}

/// Searches the caller's tasks by title/description substring
///
/// # Errors
///
/// - `400 Bad Request`: Missing or empty search term
pub async fn search_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<TaskWithUsers>>> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search query is required".to_string()))?;

    let tasks = Task::search(&state.db, auth.user_id, term).await?;

    Ok(Json(tasks))
}

/// Filters the caller's tasks by status, priority, due window, and assignee
pub async fn filter_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<TaskWithUsers>>> {
    let tasks = Task::filter(&state.db, auth.user_id, filter).await?;

    Ok(Json(tasks))
}

/// Lists all tasks in a given status
pub async fn list_tasks_by_status(
    State(state): State<AppState>,
    Path(status): Path<TaskStatus>,
) -> ApiResult<Json<Vec<TaskWithUsers>>> {
    let tasks = Task::list_by_status(&state.db, status).await?;

    Ok(Json(tasks))
}

/// Gets a single task with creator/assignee identity
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskWithUsers>> {
    let task = Task::find_by_id_with_users(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Creates a task
///
/// If the task is assigned to someone other than the caller, the assignee
/// gets a notification: the row is persisted before this handler responds,
/// and a live push is attempted on top.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed or unknown assignee
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    if let Some(assignee_id) = req.assignee_id {
        ensure_assignee_exists(&state, assignee_id).await?;
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            creator_id: auth.user_id,
            assignee_id: req.assignee_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, creator_id = %auth.user_id, "Task created");

    // Side effect: notify the assignee, if any
    if let Some(draft) = notify::on_task_created(&task, auth.user_id) {
        notify::record_and_push(&state.db, &state.dispatcher, draft).await;
    }

    Ok((StatusCode::CREATED, Json(task)))
}

/// Updates a task
///
/// Only the creator or the current assignee may update. Reassignment and
/// completion raise notifications per the rules in `notify`.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is neither creator nor assignee
/// - `404 Not Found`: Task does not exist
/// - `422 Unprocessable Entity`: Validation failed or unknown assignee
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    validate_update(&update)?;

    let existing = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    // Permission: creator or current assignee only
    if existing.creator_id != auth.user_id && existing.assignee_id != Some(auth.user_id) {
        return Err(ApiError::Forbidden(
            "You don't have permission to update this task".to_string(),
        ));
    }

    if let Some(Some(assignee_id)) = update.assignee_id {
        ensure_assignee_exists(&state, assignee_id).await?;
    }

    // Decide notifications against the pre-update state
    let notices = notify::on_task_updated(&existing, &update, auth.user_id);

    let updated = Task::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    for draft in notices {
        notify::record_and_push(&state.db, &state.dispatcher, draft).await;
    }

    Ok(Json(updated))
}

/// Deletes a task
///
/// Only the creator may delete. No notification is raised.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the creator
/// - `404 Not Found`: Task does not exist
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let existing = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if existing.creator_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this task".to_string(),
        ));
    }

    Task::delete(&state.db, id).await?;

    tracing::info!(task_id = %id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Validates the updatable fields that carry content constraints
///
/// `UpdateTask` distinguishes absent from null, so constraint checks run only
/// on fields that are actually being set.
fn validate_update(update: &UpdateTask) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    if let Some(title) = &update.title {
        if title.len() < 3 {
            errors.push(ValidationErrorDetail {
                field: "title".to_string(),
                message: "Title must be at least 3 characters".to_string(),
            });
        }
    }

    if let Some(Some(description)) = &update.description {
        if description.len() < 5 {
            errors.push(ValidationErrorDetail {
                field: "description".to_string(),
                message: "Description must be at least 5 characters".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(errors))
    }
}

/// Rejects task writes that point at a nonexistent assignee
async fn ensure_assignee_exists(state: &AppState, assignee_id: Uuid) -> Result<(), ApiError> {
    if User::exists(&state.db, assignee_id).await? {
        Ok(())
    } else {
        Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "assignee_id".to_string(),
            message: "Assignee does not exist".to_string(),
        }]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_update_accepts_partial_updates() {
        let update = UpdateTask {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        assert!(validate_update(&update).is_ok());

        // Clearing the description is always valid
        let update = UpdateTask {
            description: Some(None),
            ..Default::default()
        };
        assert!(validate_update(&update).is_ok());
    }

    #[test]
    fn test_validate_update_rejects_short_fields() {
        let update = UpdateTask {
            title: Some("ab".to_string()),
            description: Some(Some("abc".to_string())),
            ..Default::default()
        };

        let err = validate_update(&update).unwrap_err();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "title");
                assert_eq!(details[1].field, "description");
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
