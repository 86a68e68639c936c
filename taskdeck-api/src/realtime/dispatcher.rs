/// Best-effort push dispatcher
///
/// Given a freshly persisted notification, the dispatcher looks up the
/// recipient's live connection and forwards the event. Every failure mode
/// (recipient not connected, connection mid-teardown) ends here as a log
/// line. Callers have already durably stored the notification, and the
/// recipient reconciles by reading it on the next poll.

use std::sync::Arc;
use taskdeck_shared::models::notification::Notification;

use super::message::ServerMessage;
use super::registry::ConnectionRegistry;

/// Forwards notifications to live connections
#[derive(Debug, Clone)]
pub struct PushDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl PushDispatcher {
    /// Creates a dispatcher over the given registry
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Pushes a notification to its recipient if they are connected
    ///
    /// Fire-and-forget: the message is queued on the connection's outbound
    /// channel and written by the connection's own task. Never blocks, never
    /// returns an error, never touches the notification store.
    pub fn dispatch(&self, notification: &Notification) {
        let Some(connection) = self.registry.lookup(notification.recipient_id) else {
            tracing::debug!(
                recipient_id = %notification.recipient_id,
                notification_id = %notification.id,
                "Recipient not connected, skipping push"
            );
            return;
        };

        let message = ServerMessage::Notification {
            data: notification.clone(),
        };

        // Send fails only when the connection task has already dropped its
        // receiver (socket closing); the durable record covers that window.
        if let Err(e) = connection.send(message) {
            tracing::warn!(
                recipient_id = %notification.recipient_id,
                notification_id = %notification.id,
                error = %e,
                "Failed to push notification to live connection"
            );
        } else {
            tracing::debug!(
                recipient_id = %notification.recipient_id,
                notification_id = %notification.id,
                "Pushed notification to live connection"
            );
        }
    }
}
