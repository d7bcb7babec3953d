/// User endpoints
///
/// Registration and login are public; everything else runs behind the
/// authentication layer. Responses only ever carry the [`UserProfile`]
/// view, never the row itself.
///
/// # Endpoints
///
/// - `POST /users` - register
/// - `POST /users/login` - login, returns `{user, token}`
/// - `POST /users/logout` - revoke the presenting session's token
/// - `POST /users/logoutAll` - revoke every session
/// - `GET /users/me` - caller's profile
/// - `PATCH /users/me` - allow-listed profile update
/// - `DELETE /users/me` - delete account, cascading tasks
/// - `POST /users/me/avatar` - multipart upload, field "avatar"
/// - `DELETE /users/me/avatar` - clear avatar
/// - `GET /users/:id/avatar` - stored PNG
use crate::{
    app::AppState,
    avatar::{self, AvatarError},
    error::{ApiError, ApiResult},
    middleware::auth::AuthSession,
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskmate_shared::{
    auth::password,
    models::{
        task::Task,
        user::{NewUser, User, UserChanges, UserProfile},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Fields a PATCH /users/me request may name
const USER_UPDATE_FIELDS: [&str; 4] = ["name", "email", "password", "age"];

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (checked against the password policy, then hashed)
    pub password: String,

    /// Optional age, defaults to 0
    #[validate(range(min = 0, message = "Age must be a non-negative number"))]
    pub age: Option<i32>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for register and login: the public profile plus a fresh
/// session token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

/// Typed shape of an allow-listed profile update
///
/// Deserialized only after the raw keys pass the whitelist, so an unknown
/// field is rejected before any value is looked at.
#[derive(Debug, Deserialize, Validate)]
struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    email: Option<String>,

    password: Option<String>,

    #[validate(range(min = 0, message = "Age must be a non-negative number"))]
    age: Option<i32>,
}

/// Register a new user
///
/// Creates the account, queues the welcome email, and issues the first
/// session token.
///
/// # Errors
///
/// - `400` validation failure (including the password policy)
/// - `409` email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password(&req.password)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        NewUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            age: req.age.unwrap_or(0),
            password_hash,
        },
    )
    .await?;

    // Best effort; a mail failure must not fail the registration
    state
        .mailer
        .spawn_welcome(user.email.clone(), user.name.clone());

    let token = user.generate_auth_token(&state.db, state.jwt_secret()).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserProfile::from(&user),
            token,
        }),
    ))
}

/// Login with email and password
///
/// # Errors
///
/// `401` with the generic message for an unknown email or a wrong password;
/// the two are indistinguishable by design.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_credentials(&state.db, &req.email, &req.password)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let token = user.generate_auth_token(&state.db, state.jwt_secret()).await?;

    Ok(Json(AuthResponse {
        user: UserProfile::from(&user),
        token,
    }))
}

/// Logout the presenting session only
///
/// Removes exactly the token this request authenticated with; other
/// sessions of the same user stay valid.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<()> {
    User::remove_token(&state.db, session.user.id, &session.token).await?;
    Ok(())
}

/// Logout every session of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<()> {
    User::clear_tokens(&state.db, session.user.id).await?;
    Ok(())
}

/// Return the caller's profile
pub async fn me(Extension(session): Extension<AuthSession>) -> Json<UserProfile> {
    Json(UserProfile::from(&session.user))
}

/// Update the caller's profile
///
/// The raw JSON keys are checked against the allow-list first; a request
/// naming any other field is rejected with 400 and nothing is written.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UserProfile>> {
    let Value::Object(body) = body else {
        return Err(ApiError::BadRequest(
            "Update payload must be a JSON object".to_string(),
        ));
    };

    if let Some(field) = body
        .keys()
        .find(|key| !USER_UPDATE_FIELDS.contains(&key.as_str()))
    {
        return Err(ApiError::BadRequest(format!("Invalid update field: {}", field)));
    }

    let req: UpdateUserRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid update payload: {}", e)))?;
    req.validate()?;

    let password_hash = match req.password {
        Some(candidate) => {
            password::validate_password(&candidate)
                .map_err(|message| ApiError::invalid_field("password", message))?;
            Some(password::hash_password(&candidate)?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: req.name.map(|name| name.trim().to_string()),
        email: req.email.map(|email| email.trim().to_lowercase()),
        age: req.age,
        password_hash,
    };

    if changes.is_empty() {
        return Ok(Json(UserProfile::from(&session.user)));
    }

    let user = User::update(&state.db, session.user.id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}

/// Delete the caller's account
///
/// Cascade order matters: the user's tasks go first, then the user row, so
/// no task is ever left pointing at a deleted owner. The cancellation email
/// is queued after the deletion and cannot fail it.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<UserProfile>> {
    Task::delete_all_owned(&state.db, session.user.id).await?;
    User::delete(&state.db, session.user.id).await?;

    state
        .mailer
        .spawn_cancellation(session.user.email.clone(), session.user.name.clone());

    Ok(Json(UserProfile::from(&session.user)))
}

/// Upload an avatar image
///
/// Accepts a single multipart field named `avatar`. The extension
/// allow-list and the size cap are enforced before the image is normalized
/// to the canonical 250x250 PNG and stored on the user row.
///
/// # Errors
///
/// `400` carrying the reason for a missing field, bad extension, oversized
/// upload, or undecodable image.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    mut multipart: Multipart,
) -> ApiResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("avatar") => {
                let filename = field.file_name().unwrap_or_default();
                if !avatar::allowed_extension(filename) {
                    return Err(ApiError::BadRequest(
                        AvatarError::UnsupportedExtension.to_string(),
                    ));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Could not read upload: {}", e)))?;

                let png = avatar::normalize(&bytes).map_err(|e| match e {
                    AvatarError::Encode(_) => ApiError::InternalError(e.to_string()),
                    _ => ApiError::BadRequest(e.to_string()),
                })?;

                User::set_avatar(&state.db, session.user.id, &png).await?;
                return Ok(());
            }
            other => {
                return Err(ApiError::BadRequest(format!(
                    "Unexpected upload field '{}'",
                    other.unwrap_or("")
                )));
            }
        }
    }

    Err(ApiError::BadRequest("Missing 'avatar' field".to_string()))
}

/// Clear the caller's avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<()> {
    User::clear_avatar(&state.db, session.user.id).await?;
    Ok(())
}

/// Fetch any user's avatar by id
///
/// Served as the canonical stored format, so the content type is always
/// `image/png`.
///
/// # Errors
///
/// `404` if the user does not exist or has no avatar.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<([(header::HeaderName, &'static str); 1], Vec<u8>)> {
    let png = User::avatar(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Avatar not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
