/// Application state and router builder
///
/// Defines the shared state handed to every handler and assembles the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskmate_api::{app::AppState, config::Config, notify::Mailer};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let mailer = Mailer::new(config.mail.api_key.clone(), config.mail.from.clone());
/// let state = AppState::new(pool, config, mailer);
/// let app = taskmate_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::{avatar::MAX_AVATAR_BYTES, config::Config, middleware::auth, notify::Mailer, routes};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally so the clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Mail client for account notifications
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET    /health                  # liveness (public)
/// ├── POST   /users                   # register (public)
/// ├── POST   /users/login             # login (public)
/// ├── POST   /users/logout            # authenticated from here down
/// ├── POST   /users/logoutAll
/// ├── GET    /users/me
/// ├── PATCH  /users/me
/// ├── DELETE /users/me
/// ├── POST   /users/me/avatar
/// ├── DELETE /users/me/avatar
/// ├── GET    /users/:id/avatar
/// ├── POST   /tasks
/// ├── GET    /tasks
/// ├── DELETE /tasks/deleteAll         # static segment wins over :id
/// ├── GET    /tasks/:id
/// ├── PATCH  /tasks/:id
/// └── DELETE /tasks/:id
/// ```
///
/// `/tasks/deleteAll` collides syntactically with `/tasks/:id`; axum
/// resolves it by preferring the static segment, independent of
/// registration order, so the precedence is structural rather than
/// incidental.
pub fn build_router(state: AppState) -> Router {
    // Public routes, no auth
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login));

    // Everything else requires a valid, unrevoked session token
    let protected_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(routes::users::upload_avatar)
                .delete(routes::users::delete_avatar)
                // Upload cap plus headroom for the multipart framing
                .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + 64 * 1024)),
        )
        .route("/users/:id/avatar", get(routes::users::get_avatar))
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/tasks/deleteAll", delete(routes::tasks::delete_all_tasks))
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
