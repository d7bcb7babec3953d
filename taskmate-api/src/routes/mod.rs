/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness probe
/// - `users`: registration, sessions, profile, avatar
/// - `tasks`: task CRUD and listing

pub mod health;
pub mod tasks;
pub mod users;
