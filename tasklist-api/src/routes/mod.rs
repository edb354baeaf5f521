/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `tasks`: The caller's tasks
/// - `users`: The caller's profile

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
