/// Middleware for the API server
///
/// - `auth`: bearer-token authentication with per-session revocation

pub mod auth;
