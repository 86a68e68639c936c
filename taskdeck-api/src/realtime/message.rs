/// WebSocket wire protocol
///
/// Three message shapes cross the socket, all JSON with a `type` tag:
///
/// - client → server: `{"type": "auth", "userId": "<uuid>"}`, sent once after
///   connecting
/// - server → client: `{"type": "connected"}` as a connection acknowledgment
/// - server → client: `{"type": "notification", "data": {...}}` carrying a
///   persisted notification record
///
/// No other message types are defined.

use serde::{Deserialize, Serialize};
use taskdeck_shared::models::notification::Notification;
use uuid::Uuid;

/// Messages a client may send to the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Binds this connection to a user in the connection registry
    Auth {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
}

/// Messages the server pushes to clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Sent once, immediately after the connection is established
    Connected,

    /// A notification that was just persisted for this user
    Notification { data: Notification },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_auth_message_parses() {
        let user_id = Uuid::new_v4();
        let raw = format!(r#"{{"type": "auth", "userId": "{}"}}"#, user_id);

        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg, ClientMessage::Auth { user_id });
    }

    #[test]
    fn test_malformed_client_messages_rejected() {
        // Not JSON at all
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());

        // Unknown type
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "ping"}"#).is_err());

        // Missing userId
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "auth"}"#).is_err());

        // userId that is not a UUID
        assert!(
            serde_json::from_str::<ClientMessage>(r#"{"type": "auth", "userId": "abc"}"#).is_err()
        );
    }

    #[test]
    fn test_connected_wire_format() {
        let json = serde_json::to_value(ServerMessage::Connected).unwrap();
        assert_eq!(json, serde_json::json!({"type": "connected"}));
    }

    #[test]
    fn test_notification_wire_format() {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            message: "You have been assigned a new task: Draft spec".to_string(),
            read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(ServerMessage::Notification {
            data: notification.clone(),
        })
        .unwrap();

        assert_eq!(json["type"], "notification");
        assert_eq!(json["data"]["message"], notification.message);
        assert_eq!(json["data"]["read"], serde_json::json!(false));
    }
}
