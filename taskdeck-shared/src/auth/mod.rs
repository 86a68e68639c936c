/// Authentication utilities for TaskDeck
///
/// This module provides the building blocks the API server composes into its
/// login flow:
///
/// - `password`: Argon2id password hashing and verification
/// - `jwt`: JWT token generation and validation (access + refresh)
/// - `middleware`: request authentication context

pub mod jwt;
pub mod middleware;
pub mod password;
