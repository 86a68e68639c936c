/// Real-time notification delivery
///
/// This module implements the push half of the notification pipeline. Every
/// notification is persisted first; delivery here is best-effort on top of
/// that durable record, and clients reconcile by re-reading their
/// notification list.
///
/// # Components
///
/// - `message`: the WebSocket wire protocol (auth, connected, notification)
/// - `registry`: live-connection registry, one entry per authenticated user
/// - `dispatcher`: best-effort push of a notification to its recipient
/// - `socket`: WebSocket upgrade handler and per-connection lifecycle

pub mod dispatcher;
pub mod message;
pub mod registry;
pub mod socket;

pub use dispatcher::PushDispatcher;
pub use message::{ClientMessage, ServerMessage};
pub use registry::{ConnectionHandle, ConnectionRegistry};
