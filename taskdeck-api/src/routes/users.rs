/// User endpoints
///
/// # Endpoints
///
/// - `GET /v1/users` - List all users (for assignee pickers)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use taskdeck_shared::models::user::{User, UserSummary};

/// Lists all users as wire-safe summaries
///
/// Every authenticated user can see the team roster; that's what assignment
/// pickers are built from. Password hashes never appear in the projection.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list_summaries(&state.db).await?;

    Ok(Json(users))
}
