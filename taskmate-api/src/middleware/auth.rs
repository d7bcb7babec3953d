/// Bearer-token authentication middleware
///
/// Extracts the token from the `Authorization` header, verifies its
/// signature and expiry, then resolves the user whose id is embedded in the
/// claims AND whose stored token list still contains this exact string.
/// The list membership is the revocation mechanism: after logout the
/// signature still verifies but the lookup fails.
///
/// Every failure mode (missing header, malformed token, bad signature,
/// expired, revoked, unknown user) produces the identical 401 so callers
/// cannot probe which check rejected them.
///
/// On success an [`AuthSession`] lands in the request extensions, carrying
/// both the resolved user and the raw token string so logout can revoke
/// exactly the session that made the call.
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use taskmate_shared::{auth::jwt, models::user::User};

use crate::{app::AppState, error::ApiError};

/// Authenticated session attached to the request
///
/// Extract with `Extension<AuthSession>` in protected handlers.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The resolved user
    pub user: User,

    /// The exact token string this request authenticated with
    pub token: String,
}

/// Pulls the bearer token out of the Authorization header
///
/// None if the header is absent, not valid UTF-8, or not a Bearer scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Authentication layer for protected routes
///
/// # Errors
///
/// 401 with the generic message for any authentication failure; 500 only
/// if the user lookup itself fails.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthorized)?;

    let claims =
        jwt::validate_token(&token, &state.config.jwt.secret).map_err(|_| ApiError::Unauthorized)?;

    let user = User::find_by_id_and_token(&state.db, claims.sub, &token)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthSession { user, token });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parses_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );

        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_bearer_token_is_case_sensitive_on_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer abc"),
        );

        assert!(bearer_token(&headers).is_none());
    }
}
