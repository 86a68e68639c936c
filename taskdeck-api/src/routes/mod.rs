/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `users`: User listing
/// - `tasks`: Task CRUD and query endpoints
/// - `notifications`: Notification listing, read-marking, explicit send

pub mod auth;
pub mod health;
pub mod notifications;
pub mod tasks;
pub mod users;
