//! # TaskDeck Client Subscriber
//!
//! The listening end of TaskDeck's real-time channel. A subscriber opens the
//! server's `/ws` endpoint, authenticates by sending its user ID, and invokes
//! a handler for every pushed event. UIs typically react to a
//! [`ServerEvent::Notification`] by re-fetching their notification list from
//! the HTTP API; the pushed event is a hint, the stored rows are the truth.
//!
//! On unexpected disconnect the subscriber retries with a fixed delay up to a
//! bounded number of attempts, re-authenticating on every successful
//! reconnect. When the attempts are exhausted it gives up silently; the
//! durable notification records remain readable over HTTP.
//!
//! ## Example
//!
//! ```no_run
//! use taskdeck_client::{ServerEvent, Subscriber, SubscriberConfig};
//! use uuid::Uuid;
//!
//! # async fn example(user_id: Uuid) {
//! let config = SubscriberConfig::new("ws://localhost:8080/ws", user_id);
//!
//! Subscriber::new(config)
//!     .run(|event| match event {
//!         ServerEvent::Connected => println!("channel up"),
//!         ServerEvent::Notification { data } => println!("notified: {}", data.message),
//!     })
//!     .await;
//! # }
//! ```

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use taskdeck_shared::models::notification::Notification;
use tokio_tungstenite::{connect_async, tungstenite};
use uuid::Uuid;

/// Events the server pushes over the channel
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Connection acknowledgment, sent once after connecting
    Connected,

    /// A notification stored for this user
    Notification { data: Notification },
}

/// Subscriber errors
///
/// These stay internal to the retry loop; `run` itself never returns one.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// Could not establish the connection
    #[error("failed to connect: {0}")]
    Connect(#[source] tungstenite::Error),

    /// Could not send the auth message
    #[error("failed to send auth message: {0}")]
    Auth(#[source] tungstenite::Error),

    /// The established connection failed
    #[error("transport error: {0}")]
    Transport(#[source] tungstenite::Error),
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/ws`
    pub url: String,

    /// User ID sent in the auth message after each (re)connect
    pub user_id: Uuid,

    /// Fixed delay between reconnect attempts
    pub reconnect_delay: Duration,

    /// Reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
}

impl SubscriberConfig {
    /// Creates a config with the default reconnect policy
    /// (3 second delay, 5 attempts)
    pub fn new(url: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            url: url.into(),
            user_id,
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_attempts: 5,
        }
    }
}

/// Reconnecting event listener
#[derive(Debug)]
pub struct Subscriber {
    config: SubscriberConfig,
}

impl Subscriber {
    /// Creates a subscriber from a config
    pub fn new(config: SubscriberConfig) -> Self {
        Self { config }
    }

    /// Runs the subscriber until the reconnect budget is exhausted
    ///
    /// The handler is invoked inline for each event, so it should hand
    /// heavier work off to a channel or task. A successfully established
    /// session resets the attempt counter; after the final attempt the
    /// subscriber returns without error.
    pub async fn run<F>(self, mut on_event: F)
    where
        F: FnMut(ServerEvent),
    {
        let mut attempts = 0u32;

        loop {
            match self.connect_and_listen(&mut on_event).await {
                Ok(()) => {
                    // Session was established and then closed
                    tracing::debug!("Connection closed");
                    attempts = 0;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Connection attempt failed");
                }
            }

            attempts += 1;
            if attempts > self.config.max_reconnect_attempts {
                tracing::debug!(
                    attempts = self.config.max_reconnect_attempts,
                    "Reconnect attempts exhausted, giving up"
                );
                return;
            }

            tracing::debug!(
                attempt = attempts,
                max = self.config.max_reconnect_attempts,
                "Reconnecting"
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// One connection lifetime: connect, authenticate, listen until close
    async fn connect_and_listen<F>(&self, on_event: &mut F) -> Result<(), SubscriberError>
    where
        F: FnMut(ServerEvent),
    {
        let (ws_stream, _response) = connect_async(self.config.url.as_str())
            .await
            .map_err(SubscriberError::Connect)?;

        tracing::debug!(url = %self.config.url, "WebSocket connection established");

        let (mut sink, mut stream) = ws_stream.split();

        // Authenticate immediately on every (re)connect
        sink.send(tungstenite::Message::Text(auth_message(self.config.user_id)))
            .await
            .map_err(SubscriberError::Auth)?;

        while let Some(message) = stream.next().await {
            match message {
                Ok(tungstenite::Message::Text(text)) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => on_event(event),
                        Err(e) => {
                            tracing::debug!(error = %e, "Ignoring unrecognized server message");
                        }
                    }
                }
                Ok(tungstenite::Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => return Err(SubscriberError::Transport(e)),
            }
        }

        Ok(())
    }
}

/// Builds the auth message binding this connection to a user
fn auth_message(user_id: Uuid) -> String {
    serde_json::json!({ "type": "auth", "userId": user_id }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_config_defaults() {
        let config = SubscriberConfig::new("ws://localhost:8080/ws", Uuid::new_v4());

        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_auth_message_wire_format() {
        let user_id = Uuid::new_v4();
        let raw = auth_message(user_id);

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "auth");
        assert_eq!(value["userId"], user_id.to_string());
    }

    #[test]
    fn test_connected_event_parses() {
        let event: ServerEvent = serde_json::from_str(r#"{"type": "connected"}"#).unwrap();
        assert!(matches!(event, ServerEvent::Connected));
    }

    #[test]
    fn test_notification_event_parses() {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            message: "You have been assigned a new task: Draft spec".to_string(),
            read: false,
            created_at: Utc::now(),
        };
        let raw = serde_json::json!({ "type": "notification", "data": notification }).to_string();

        let event: ServerEvent = serde_json::from_str(&raw).unwrap();
        match event {
            ServerEvent::Notification { data } => {
                assert_eq!(data.id, notification.id);
                assert!(data.message.contains("Draft spec"));
            }
            other => panic!("Expected notification event, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ServerEvent>(r#"{"type": "heartbeat"}"#).is_err());
    }
}
