/// Database models
///
/// # Models
///
/// - `user`: User accounts, session tokens, and the public profile view
/// - `task`: Task records owned by a user, with list filtering and sorting
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::models::user::{NewUser, User};
/// use taskmate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, NewUser {
///     name: "Ann".to_string(),
///     email: "ann@example.com".to_string(),
///     age: 30,
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub mod task;
pub mod user;
