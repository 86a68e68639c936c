/// Live connection registry
///
/// Tracks at most one live WebSocket connection per authenticated user. The
/// registry is constructed once at startup, owned by `AppState`, and shared
/// by reference with the socket handlers and the push dispatcher; it is never
/// a module-level global.
///
/// Entries hold the sending half of each connection's outbound queue, so
/// callers can hand a message to a connection without awaiting socket I/O.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::message::ServerMessage;

/// Sending half of a connection's outbound queue
pub type ConnectionHandle = mpsc::UnboundedSender<ServerMessage>;

/// Registry mapping user IDs to their live connection
///
/// All access is serialized through an internal mutex. The lock is never held
/// across an await point; every operation is a short map access.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<Uuid, ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection for a user
    ///
    /// Last writer wins: if the user already has a registered connection
    /// (say, a second browser tab), the new one silently replaces it. The
    /// displaced connection stays open but no longer receives pushes.
    pub fn register(&self, user_id: Uuid, handle: ConnectionHandle) {
        let mut connections = self.connections.lock().expect("registry lock poisoned");
        if connections.insert(user_id, handle).is_some() {
            tracing::debug!(user_id = %user_id, "Replaced existing connection registration");
        } else {
            tracing::debug!(user_id = %user_id, "Registered connection");
        }
    }

    /// Removes whichever entry currently points at this exact connection
    ///
    /// Identity is channel identity, not user ID: if the user reconnected and
    /// the entry was already overwritten, the stale connection's departure
    /// leaves the newer registration untouched. The O(n) scan is fine; the
    /// map is bounded by concurrently connected users.
    pub fn unregister(&self, handle: &ConnectionHandle) {
        let mut connections = self.connections.lock().expect("registry lock poisoned");
        if let Some(user_id) = connections
            .iter()
            .find(|(_, registered)| registered.same_channel(handle))
            .map(|(user_id, _)| *user_id)
        {
            connections.remove(&user_id);
            tracing::debug!(user_id = %user_id, "Unregistered connection");
        }
    }

    /// Looks up the live connection for a user, if any
    pub fn lookup(&self, user_id: Uuid) -> Option<ConnectionHandle> {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.get(&user_id).cloned()
    }

    /// Number of currently registered connections
    pub fn len(&self) -> usize {
        let connections = self.connections.lock().expect("registry lock poisoned");
        connections.len()
    }

    /// Whether the registry has no registered connections
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
