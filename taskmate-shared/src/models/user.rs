/// User model and database operations
///
/// A user row carries the account fields, the argon2id password hash, the
/// ordered list of currently valid session tokens, and (optionally) the
/// avatar image. The avatar blob is never selected by the row queries here;
/// it moves only through the dedicated avatar operations.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     password_hash VARCHAR(255) NOT NULL,
///     tokens TEXT[] NOT NULL DEFAULT '{}',
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{
    jwt::{self, JwtError},
    password,
};

/// Columns of the user row, excluding the avatar blob
const USER_COLUMNS: &str = "id, name, email, age, password_hash, tokens, created_at, updated_at";

/// User model representing an account
///
/// Deliberately does not implement `Serialize`: every external
/// representation goes through [`UserProfile`], which cannot carry the
/// password hash, token list, or avatar.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, stored lower-cased, unique across all users
    pub email: String,

    /// Age in years, non-negative, defaults to 0
    pub age: i32,

    /// Argon2id password hash (never plaintext)
    pub password_hash: String,

    /// Ordered list of issued session tokens
    ///
    /// A signed token that is no longer in this list is revoked, even though
    /// its signature still verifies.
    pub tokens: Vec<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, the only serializable representation
///
/// Omits the password hash, session tokens, and avatar by construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a new user
///
/// The caller normalizes (trim, lower-case email) and hashes the password
/// before constructing this.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub password_hash: String,
}

/// Partial update of a user row
///
/// Only non-None fields are written. A password change arrives here already
/// hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// True if no field would be written
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.password_hash.is_none()
    }
}

/// Error issuing a session token
#[derive(Debug, thiserror::Error)]
pub enum AuthTokenError {
    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// A duplicate email surfaces as a database error carrying the unique
    /// constraint name.
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, age, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.age)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address
    ///
    /// Emails are stored lower-cased; the caller lower-cases the input.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Looks up a user by credentials
    ///
    /// Returns `Ok(None)` for an unknown email, a wrong password, or an
    /// undecodable stored hash, so callers can only produce one generic
    /// "unable to login" failure and cannot enumerate accounts.
    pub async fn find_by_credentials(
        pool: &PgPool,
        email: &str,
        candidate: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(user) = Self::find_by_email(pool, &email.to_lowercase()).await? else {
            return Ok(None);
        };

        match password::verify_password(candidate, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!(user_id = %user.id, "Stored password hash failed to verify: {}", e);
                Ok(None)
            }
        }
    }

    /// Finds the user a presented session token belongs to
    ///
    /// The id from the token's claims must match AND the exact token string
    /// must still be in the user's token list. This is the revocation check:
    /// logout removes the string from the list and the signature alone no
    /// longer suffices.
    pub async fn find_by_id_and_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND $2 = ANY(tokens)");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Signs a new session token for this user and appends it to the token
    /// list
    ///
    /// The sign and the append are two steps with no compensating rollback;
    /// a crash in between leaves a signed token that never became valid.
    pub async fn generate_auth_token(
        &self,
        pool: &PgPool,
        secret: &str,
    ) -> Result<String, AuthTokenError> {
        let token = jwt::create_token(&jwt::Claims::new(self.id), secret)?;

        sqlx::query("UPDATE users SET tokens = array_append(tokens, $2), updated_at = NOW() WHERE id = $1")
            .bind(self.id)
            .bind(&token)
            .execute(pool)
            .await?;

        Ok(token)
    }

    /// Removes one session token (logout of the presenting session only)
    pub async fn remove_token(pool: &PgPool, id: Uuid, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET tokens = array_remove(tokens, $2), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Removes every session token (logout of all sessions)
    pub async fn clear_tokens(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET tokens = '{}', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Applies a partial update to a user row
    ///
    /// Builds the statement dynamically from the fields that are present.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the row no longer exists
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if changes.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if changes.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if changes.age.is_some() {
            bind_count += 1;
            query.push_str(&format!(", age = ${}", bind_count));
        }
        if changes.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(email) = changes.email {
            q = q.bind(email);
        }
        if let Some(age) = changes.age {
            q = q.bind(age);
        }
        if let Some(password_hash) = changes.password_hash {
            q = q.bind(password_hash);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user row
    ///
    /// The row delete only. The caller is responsible for the cascade:
    /// delete the user's tasks first, in the same operation.
    ///
    /// # Returns
    ///
    /// True if the user existed and was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores the normalized avatar image for a user
    pub async fn set_avatar(pool: &PgPool, id: Uuid, png: &[u8]) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(png)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears a user's avatar
    pub async fn clear_avatar(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET avatar = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetches a user's stored avatar bytes
    ///
    /// None if the user does not exist or has no avatar.
    pub async fn avatar(pool: &PgPool, id: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT avatar FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(row.and_then(|(avatar,)| avatar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            age: 30,
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$salt$hash".to_string(),
            tokens: vec!["token-a".to_string(), "token-b".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_omits_private_fields() {
        let user = sample_user();
        let profile = UserProfile::from(&user);

        let json = serde_json::to_value(&profile).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object["name"], "Ann");
        assert_eq!(object["email"], "ann@example.com");
        assert_eq!(object["age"], 30);
        assert!(object.contains_key("createdAt"));
        assert!(object.contains_key("updatedAt"));

        // The serialization boundary, not caller discipline, hides these
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("tokens"));
        assert!(!object.contains_key("avatar"));
    }

    #[test]
    fn test_profile_serialized_text_never_contains_hash() {
        let user = sample_user();
        let text = serde_json::to_string(&UserProfile::from(&user)).unwrap();

        assert!(!text.contains("argon2id"));
        assert!(!text.contains("token-a"));
    }

    #[test]
    fn test_user_changes_is_empty() {
        assert!(UserChanges::default().is_empty());

        let changes = UserChanges {
            age: Some(31),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
