/// Task endpoints
///
/// Every handler runs behind the authentication layer and every query is
/// scoped to the caller: the owner column is always forced to the
/// authenticated user, and a task owned by someone else responds exactly
/// like a missing one (404).
///
/// # Endpoints
///
/// - `POST /tasks` - create, owner forced to caller
/// - `GET /tasks` - list with `completed`, `limit`, `skip`, `sortBy`
/// - `GET /tasks/:id` - fetch one owned task
/// - `PATCH /tasks/:id` - allow-listed update
/// - `DELETE /tasks/:id` - delete one owned task
/// - `DELETE /tasks/deleteAll` - delete every owned task
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthSession,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskmate_shared::models::task::{NewTask, Task, TaskChanges, TaskListQuery, TaskSort};
use uuid::Uuid;
use validator::Validate;

/// Fields a PATCH /tasks/:id request may name
const TASK_UPDATE_FIELDS: [&str; 2] = ["description", "completed"];

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// What needs doing
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    /// Done flag, defaults to false
    #[serde(default)]
    pub completed: bool,
}

/// Listing refinements, all optional and independent
///
/// `GET /tasks?completed=true&sortBy=createdAt:desc&limit=2&skip=0`
#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    /// Equality filter on the done flag
    pub completed: Option<bool>,

    /// Page size
    pub limit: Option<i64>,

    /// Rows to skip before the page
    pub skip: Option<i64>,

    /// `field:asc|desc` sort token
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// Typed shape of an allow-listed task update
#[derive(Debug, Deserialize, Validate)]
struct UpdateTaskRequest {
    #[validate(length(min = 1, message = "Description must not be empty"))]
    description: Option<String>,

    completed: Option<bool>,
}

/// Bulk delete response
#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    /// Number of tasks removed
    pub deleted: u64,
}

/// Create a task owned by the caller
///
/// The owner comes from the authenticated session, never from the body.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiError::invalid_field(
            "description",
            "Description must not be empty",
        ));
    }

    let task = Task::create(
        &state.db,
        NewTask {
            description,
            completed: req.completed,
            owner: session.user.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// # Errors
///
/// `400` for a negative limit/skip or a `sortBy` token outside the sortable
/// field vocabulary.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<Vec<Task>>> {
    if params.limit.is_some_and(|limit| limit < 0) {
        return Err(ApiError::invalid_field("limit", "Limit must be non-negative"));
    }
    if params.skip.is_some_and(|skip| skip < 0) {
        return Err(ApiError::invalid_field("skip", "Skip must be non-negative"));
    }

    let sort = params
        .sort_by
        .as_deref()
        .map(TaskSort::parse)
        .transpose()
        .map_err(|message| ApiError::invalid_field("sortBy", message))?;

    let tasks = Task::list_owned(
        &state.db,
        session.user.id,
        TaskListQuery {
            completed: params.completed,
            limit: params.limit,
            skip: params.skip,
            sort,
        },
    )
    .await?;

    Ok(Json(tasks))
}

/// Fetch one task, only if the caller owns it
pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_owned(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Update one task, only if the caller owns it
///
/// The raw JSON keys are checked against the allow-list first; a request
/// naming any other field is rejected with 400 and nothing is written.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Task>> {
    let Value::Object(body) = body else {
        return Err(ApiError::BadRequest(
            "Update payload must be a JSON object".to_string(),
        ));
    };

    if let Some(field) = body
        .keys()
        .find(|key| !TASK_UPDATE_FIELDS.contains(&key.as_str()))
    {
        return Err(ApiError::BadRequest(format!("Invalid update field: {}", field)));
    }

    let req: UpdateTaskRequest = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid update payload: {}", e)))?;
    req.validate()?;

    let changes = TaskChanges {
        description: req.description.map(|d| d.trim().to_string()),
        completed: req.completed,
    };

    if changes.is_empty() {
        return get_task(State(state), Extension(session), Path(id)).await;
    }

    let task = Task::update_owned(&state.db, id, session.user.id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Delete one task, only if the caller owns it
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let deleted = Task::delete_owned(&state.db, id, session.user.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(())
}

/// Delete every task the caller owns
pub async fn delete_all_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<DeleteAllResponse>> {
    let deleted = Task::delete_all_owned(&state.db, session.user.id).await?;

    Ok(Json(DeleteAllResponse { deleted }))
}
