/// Task model and database operations
///
/// This module provides the Task model representing units of team work.
/// Tasks are the core entity of the TaskDeck system.
///
/// # Status Flow
///
/// ```text
/// todo → in_progress → in_review → completed
/// ```
///
/// The flow is advisory: any status can be set directly, matching a board UI
/// where cards are dragged between columns.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'in_review', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     creator_id UUID NOT NULL REFERENCES users(id),
///     assignee_id UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task::{Task, CreateTask, TaskPriority, TaskStatus};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Draft spec".to_string(),
///     description: Some("First pass at the launch spec".to_string()),
///     status: TaskStatus::Todo,
///     priority: TaskPriority::High,
///     due_date: None,
///     creator_id: Uuid::new_v4(),
///     assignee_id: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,

    /// Actively being worked on
    InProgress,

    /// Waiting on review
    InReview,

    /// Done
    Completed,
}

impl TaskStatus {
    /// Converts status to string for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checks whether this status is the terminal `completed` state
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,

    #[default]
    Medium,

    High,

    Urgent,
}

impl TaskPriority {
    /// Converts priority to string for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Task model representing a unit of team work
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short human-readable title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Current workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// User who created the task; immutable after creation
    pub creator_id: Uuid,

    /// User the task is currently assigned to, if any
    pub assignee_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task row joined with creator and assignee identity
///
/// Flat projection of `tasks JOIN users` used by list/detail endpoints so
/// clients can render names without extra lookups.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskWithUsers {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub creator_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Creator's login name
    pub creator_username: String,

    /// Creator's display name
    pub creator_name: String,

    /// Assignee's login name (None when unassigned)
    pub assignee_username: Option<String>,

    /// Assignee's display name (None when unassigned)
    pub assignee_name: Option<String>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to `todo`)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to `medium`)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Creator (taken from the authenticated caller, never the request body)
    pub creator_id: Uuid,

    /// Optional initial assignee
    pub assignee_id: Option<Uuid>,
}

/// Input for updating an existing task
///
/// All fields are optional. Only non-None fields will be updated. Nullable
/// columns use `Option<Option<T>>`: `Some(None)` clears the column, `None`
/// leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (use Some(None) to clear)
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date (use Some(None) to clear)
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    /// New assignee (use Some(None) to unassign)
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Distinguishes a JSON `null` (clear the column) from an absent field
/// (leave it untouched) when deserializing `Option<Option<T>>`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Which relationship ties a user to a task in `list_by_user`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOwnership {
    /// Tasks assigned to the user
    Assigned,

    /// Tasks created by the user
    Created,

    /// Either relationship
    #[default]
    All,
}

/// Relative due-date windows accepted by `filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    Today,
    ThisWeek,
    ThisMonth,
    Overdue,
}

impl DueFilter {
    /// SQL condition implementing the window, anchored to the start of the
    /// current day in database time. `Overdue` means strictly before today
    /// and not completed.
    fn sql_condition(&self) -> &'static str {
        match self {
            DueFilter::Today => {
                " AND t.due_date >= date_trunc('day', now()) \
                 AND t.due_date < date_trunc('day', now()) + interval '1 day'"
            }
            DueFilter::ThisWeek => {
                " AND t.due_date >= date_trunc('day', now()) \
                 AND t.due_date < date_trunc('day', now()) + interval '7 days'"
            }
            DueFilter::ThisMonth => {
                " AND t.due_date >= date_trunc('day', now()) \
                 AND t.due_date < date_trunc('day', now()) + interval '1 month'"
            }
            DueFilter::Overdue => {
                " AND t.due_date < date_trunc('day', now()) AND t.status <> 'completed'"
            }
        }
    }
}

/// Conjunctive filter set for `Task::filter`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Exact status match
    pub status: Option<TaskStatus>,

    /// Exact priority match
    pub priority: Option<TaskPriority>,

    /// Relative due-date window
    pub due: Option<DueFilter>,

    /// Exact assignee match
    pub assignee_id: Option<Uuid>,
}

/// SELECT projection for task rows joined with user identity
const WITH_USERS_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
           t.creator_id, t.assignee_id, t.created_at, t.updated_at,
           c.username AS creator_username, c.name AS creator_name,
           a.username AS assignee_username, a.name AS assignee_name
    FROM tasks t
    JOIN users c ON c.id = t.creator_id
    LEFT JOIN users a ON a.id = t.assignee_id
"#;

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when
    /// `creator_id` or `assignee_id` violate their foreign keys.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, creator_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, status, priority, due_date,
                      creator_id, assignee_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    ///
    /// Returns the bare row; used by mutation handlers for permission checks.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, due_date,
                   creator_id, assignee_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID with creator/assignee identity attached
    pub async fn find_by_id_with_users(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithUsers>, sqlx::Error> {
        let query = format!("{WITH_USERS_SELECT} WHERE t.id = $1");

        let task = sqlx::query_as::<_, TaskWithUsers>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists all tasks, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        let query = format!("{WITH_USERS_SELECT} ORDER BY t.created_at DESC");

        let tasks = sqlx::query_as::<_, TaskWithUsers>(&query)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists tasks tied to a user as creator, assignee, or either
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        ownership: TaskOwnership,
    ) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        let condition = match ownership {
            TaskOwnership::Assigned => "t.assignee_id = $1",
            TaskOwnership::Created => "t.creator_id = $1",
            TaskOwnership::All => "(t.creator_id = $1 OR t.assignee_id = $1)",
        };
        let query = format!("{WITH_USERS_SELECT} WHERE {condition} ORDER BY t.created_at DESC");

        let tasks = sqlx::query_as::<_, TaskWithUsers>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists all tasks in a given status, newest first
    pub async fn list_by_status(
        pool: &PgPool,
        status: TaskStatus,
    ) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        let query = format!("{WITH_USERS_SELECT} WHERE t.status = $1 ORDER BY t.created_at DESC");

        let tasks = sqlx::query_as::<_, TaskWithUsers>(&query)
            .bind(status)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists a user's overdue tasks
    ///
    /// Overdue means the due date is strictly before the start of the current
    /// day and the task is not completed.
    pub async fn list_overdue(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        let query = format!(
            "{WITH_USERS_SELECT} \
             WHERE (t.creator_id = $1 OR t.assignee_id = $1) \
             AND t.due_date < date_trunc('day', now()) \
             AND t.status <> 'completed' \
             ORDER BY t.created_at DESC"
        );

        let tasks = sqlx::query_as::<_, TaskWithUsers>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Searches a user's tasks by case-insensitive substring on title or description
    pub async fn search(
        pool: &PgPool,
        user_id: Uuid,
        term: &str,
    ) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        let query = format!(
            "{WITH_USERS_SELECT} \
             WHERE (t.creator_id = $1 OR t.assignee_id = $1) \
             AND (t.title ILIKE $2 OR t.description ILIKE $2) \
             ORDER BY t.created_at DESC"
        );
        let pattern = format!("%{}%", term);

        let tasks = sqlx::query_as::<_, TaskWithUsers>(&query)
            .bind(user_id)
            .bind(pattern)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Filters a user's tasks by status, priority, due-date window, and assignee
    ///
    /// Filters are conjunctive. The caller's tasks (created or assigned) form
    /// the base set.
    pub async fn filter(
        pool: &PgPool,
        user_id: Uuid,
        filter: TaskFilter,
    ) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        // Build dynamic WHERE clause based on which filters are present
        let mut query =
            format!("{WITH_USERS_SELECT} WHERE (t.creator_id = $1 OR t.assignee_id = $1)");
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.priority = ${}", bind_count));
        }
        if filter.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.assignee_id = ${}", bind_count));
        }
        if let Some(due) = filter.due {
            query.push_str(due.sql_condition());
        }

        query.push_str(" ORDER BY t.created_at DESC");

        let mut q = sqlx::query_as::<_, TaskWithUsers>(&query).bind(user_id);

        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }
        if let Some(assignee_id) = filter.assignee_id {
            q = q.bind(assignee_id);
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Updates an existing task
    ///
    /// Only non-None fields in `data` will be updated. The `updated_at`
    /// timestamp is automatically set to the current time.
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the task doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, due_date, \
             creator_id, assignee_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Notifications referencing the task are removed by CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::InReview.as_str(), "in_review");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_status_is_completed() {
        assert!(!TaskStatus::Todo.is_completed());
        assert!(!TaskStatus::InProgress.is_completed());
        assert!(!TaskStatus::InReview.is_completed());
        assert!(TaskStatus::Completed.is_completed());
    }

    #[test]
    fn test_status_serde_wire_format() {
        let status: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in_progress\"");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(TaskOwnership::default(), TaskOwnership::All);
    }

    #[test]
    fn test_update_task_default_is_noop() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.priority.is_none());
        assert!(update.due_date.is_none());
        assert!(update.assignee_id.is_none());
    }

    #[test]
    fn test_update_task_absent_vs_null_assignee() {
        // Absent field: leave assignee untouched
        let update: UpdateTask = serde_json::from_str(r#"{"title": "New title"}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("New title"));
        assert!(update.assignee_id.is_none());

        // Explicit null: clear the assignee
        let update: UpdateTask = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(update.assignee_id, Some(None));

        // Explicit value: set the assignee
        let id = Uuid::new_v4();
        let body = format!(r#"{{"assignee_id": "{}"}}"#, id);
        let update: UpdateTask = serde_json::from_str(&body).unwrap();
        assert_eq!(update.assignee_id, Some(Some(id)));
    }

    #[test]
    fn test_due_filter_overdue_excludes_completed() {
        let sql = DueFilter::Overdue.sql_condition();
        assert!(sql.contains("due_date < date_trunc('day', now())"));
        assert!(sql.contains("status <> 'completed'"));
    }
}
