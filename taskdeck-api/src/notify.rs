/// Task-mutation notification rules
///
/// Decides, after a task is created or updated, whether a notification should
/// be raised and for whom. The rules are pure functions over the task state
/// so they can be tested without a database; `record_and_push` then executes
/// a decision as two decoupled steps:
///
/// 1. persist the notification row (durable channel)
/// 2. best-effort push to the recipient's live connection
///
/// Step 1 completes before the mutation response is returned. Step 2 is
/// fire-and-forget. A notification that fails to persist after the task
/// mutation already committed is logged and dropped; the mutation itself
/// still succeeds.

use sqlx::PgPool;
use taskdeck_shared::models::notification::{CreateNotification, Notification};
use taskdeck_shared::models::task::{Task, TaskStatus, UpdateTask};
use uuid::Uuid;

use crate::realtime::PushDispatcher;

/// Notification decision for a newly created task
///
/// Fires when the task has an assignee other than the actor (the creator):
/// one event to the assignee. Self-assigned and unassigned tasks are silent.
pub fn on_task_created(task: &Task, actor_id: Uuid) -> Option<CreateNotification> {
    let assignee_id = task.assignee_id?;
    if assignee_id == actor_id {
        return None;
    }

    Some(CreateNotification {
        recipient_id: assignee_id,
        task_id: task.id,
        message: format!("You have been assigned a new task: {}", task.title),
    })
}

/// Notification decisions for a task update
///
/// Two independent rules, both judged against the task state `before` the
/// update was applied; each fires at most once and both may fire on the same
/// update:
///
/// - reassignment: the request sets a non-null assignee that differs from the
///   previous assignee and from the actor → notify the new assignee
/// - completion: the request moves status into `completed` from a
///   non-completed state and the actor is not the creator → notify the
///   creator
///
/// Deletes, unchanged assignees, assignment-to-null, non-completing status
/// changes, and repeated completed→completed updates all stay silent.
pub fn on_task_updated(before: &Task, update: &UpdateTask, actor_id: Uuid) -> Vec<CreateNotification> {
    let mut notices = Vec::new();

    if let Some(Some(new_assignee)) = update.assignee_id {
        if Some(new_assignee) != before.assignee_id && new_assignee != actor_id {
            notices.push(CreateNotification {
                recipient_id: new_assignee,
                task_id: before.id,
                message: format!("You have been assigned a task: {}", before.title),
            });
        }
    }

    if update.status == Some(TaskStatus::Completed)
        && !before.status.is_completed()
        && before.creator_id != actor_id
    {
        notices.push(CreateNotification {
            recipient_id: before.creator_id,
            task_id: before.id,
            message: format!("Task \"{}\" has been marked as completed", before.title),
        });
    }

    notices
}

/// Persists a notification, then pushes it to the recipient if connected
///
/// The insert is awaited so the record exists before the caller's response
/// goes out. The push is a non-blocking queue write. Neither a failed insert
/// nor a failed push propagates to the caller, since the task mutation has
/// already committed.
pub async fn record_and_push(
    pool: &PgPool,
    dispatcher: &PushDispatcher,
    draft: CreateNotification,
) {
    match Notification::create(pool, draft).await {
        Ok(notification) => dispatcher.dispatch(&notification),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to persist notification after committed task mutation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskdeck_shared::models::task::TaskPriority;

    fn task(creator_id: Uuid, assignee_id: Option<Uuid>, status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Draft spec".to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: None,
            creator_id,
            assignee_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_with_assignee_notifies_assignee() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let task = task(creator, Some(assignee), TaskStatus::Todo);

        let notice = on_task_created(&task, creator).expect("should notify");
        assert_eq!(notice.recipient_id, assignee);
        assert_eq!(notice.task_id, task.id);
        assert!(notice.message.contains("Draft spec"));
    }

    #[test]
    fn test_create_unassigned_is_silent() {
        let creator = Uuid::new_v4();
        let task = task(creator, None, TaskStatus::Todo);

        assert!(on_task_created(&task, creator).is_none());
    }

    #[test]
    fn test_create_self_assigned_is_silent() {
        let creator = Uuid::new_v4();
        let task = task(creator, Some(creator), TaskStatus::Todo);

        assert!(on_task_created(&task, creator).is_none());
    }

    #[test]
    fn test_update_reassignment_notifies_new_assignee() {
        let creator = Uuid::new_v4();
        let old_assignee = Uuid::new_v4();
        let new_assignee = Uuid::new_v4();
        let before = task(creator, Some(old_assignee), TaskStatus::Todo);

        let update = UpdateTask {
            assignee_id: Some(Some(new_assignee)),
            ..Default::default()
        };

        let notices = on_task_updated(&before, &update, creator);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].recipient_id, new_assignee);
        assert!(notices[0].message.contains("Draft spec"));
    }

    #[test]
    fn test_update_same_assignee_is_silent() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let before = task(creator, Some(assignee), TaskStatus::Todo);

        let update = UpdateTask {
            assignee_id: Some(Some(assignee)),
            ..Default::default()
        };

        assert!(on_task_updated(&before, &update, creator).is_empty());
    }

    #[test]
    fn test_update_assign_to_actor_is_silent() {
        let creator = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let before = task(creator, None, TaskStatus::Todo);

        // Actor assigns the task to themselves
        let update = UpdateTask {
            assignee_id: Some(Some(actor)),
            ..Default::default()
        };

        assert!(on_task_updated(&before, &update, actor).is_empty());
    }

    #[test]
    fn test_update_unassign_is_silent() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let before = task(creator, Some(assignee), TaskStatus::Todo);

        let update = UpdateTask {
            assignee_id: Some(None),
            ..Default::default()
        };

        assert!(on_task_updated(&before, &update, creator).is_empty());
    }

    #[test]
    fn test_completion_by_assignee_notifies_creator() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let before = task(creator, Some(assignee), TaskStatus::InReview);

        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        let notices = on_task_updated(&before, &update, assignee);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].recipient_id, creator);
        assert!(notices[0].message.contains("marked as completed"));
    }

    #[test]
    fn test_completion_by_creator_is_silent() {
        let creator = Uuid::new_v4();
        let before = task(creator, None, TaskStatus::InProgress);

        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        assert!(on_task_updated(&before, &update, creator).is_empty());
    }

    #[test]
    fn test_repeated_completion_is_silent() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let before = task(creator, Some(assignee), TaskStatus::Completed);

        // completed → completed: the transition already happened
        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        assert!(on_task_updated(&before, &update, assignee).is_empty());
    }

    #[test]
    fn test_non_completing_status_change_is_silent() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let before = task(creator, Some(assignee), TaskStatus::Todo);

        let update = UpdateTask {
            status: Some(TaskStatus::InReview),
            ..Default::default()
        };

        assert!(on_task_updated(&before, &update, assignee).is_empty());
    }

    #[test]
    fn test_reassignment_and_completion_both_fire() {
        let creator = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let new_assignee = Uuid::new_v4();
        let before = task(creator, Some(actor), TaskStatus::InProgress);

        let update = UpdateTask {
            assignee_id: Some(Some(new_assignee)),
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        let notices = on_task_updated(&before, &update, actor);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].recipient_id, new_assignee);
        assert_eq!(notices[1].recipient_id, creator);
    }
}
