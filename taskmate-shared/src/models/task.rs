/// Task model and database operations
///
/// Every query here is scoped by owner: a task belonging to another user is
/// indistinguishable from a task that does not exist. Listing supports three
/// independent optional refinements: an equality filter on `completed`,
/// limit/skip pagination, and a single-field sort.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Task model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// What needs doing
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// The user this task belongs to
    pub owner: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// The owner is always set by the handler from the authenticated session,
/// never from caller input.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub description: String,
    pub completed: bool,
    pub owner: Uuid,
}

/// Partial update of a task
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    /// True if no field would be written
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }
}

/// Sortable columns of a task listing
///
/// A closed set: the sort token is matched against these names and anything
/// else is rejected, so caller input never reaches the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl SortField {
    /// Column name for the ORDER BY clause
    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Description => "description",
            SortField::Completed => "completed",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A parsed `field:asc|desc` sort token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl TaskSort {
    /// Parses a `sortBy` query token, e.g. `createdAt:desc`
    ///
    /// The direction may be omitted (`createdAt`), defaulting to ascending.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending part for anything outside the
    /// field whitelist or direction set.
    pub fn parse(token: &str) -> Result<Self, String> {
        let (field_name, direction_name) = match token.split_once(':') {
            Some((field, direction)) => (field, Some(direction)),
            None => (token, None),
        };

        let field = match field_name {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "description" => SortField::Description,
            "completed" => SortField::Completed,
            other => return Err(format!("Cannot sort by field '{}'", other)),
        };

        let direction = match direction_name {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => return Err(format!("Invalid sort direction '{}'", other)),
        };

        Ok(Self { field, direction })
    }
}

/// Refinements of a task listing, all optional and independent
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    /// Equality filter on `completed`
    pub completed: Option<bool>,

    /// Page size
    pub limit: Option<i64>,

    /// Rows to skip before the page
    pub skip: Option<i64>,

    /// Single-field sort; insertion order (created_at ascending) if absent
    pub sort: Option<TaskSort>,
}

impl Task {
    /// Creates a task for its owner
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (description, completed, owner)
            VALUES ($1, $2, $3)
            RETURNING id, description, completed, owner, created_at, updated_at
            "#,
        )
        .bind(data.description)
        .bind(data.completed)
        .bind(data.owner)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by id, visible only to its owner
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, description, completed, owner, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Lists an owner's tasks with the given refinements
    ///
    /// The ORDER BY column and direction come from the closed [`TaskSort`]
    /// vocabulary; only values are bound from caller input.
    pub async fn list_owned(
        pool: &PgPool,
        owner: Uuid,
        query: TaskListQuery,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut sql = String::from(
            "SELECT id, description, completed, owner, created_at, updated_at \
             FROM tasks WHERE owner = $1",
        );
        let mut bind_count = 1;

        if query.completed.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND completed = ${}", bind_count));
        }

        match query.sort {
            Some(sort) => sql.push_str(&format!(
                " ORDER BY {} {}",
                sort.field.column(),
                sort.direction.keyword()
            )),
            None => sql.push_str(" ORDER BY created_at ASC"),
        }

        if query.limit.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" LIMIT ${}", bind_count));
        }
        if query.skip.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" OFFSET ${}", bind_count));
        }

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(owner);

        if let Some(completed) = query.completed {
            q = q.bind(completed);
        }
        if let Some(limit) = query.limit {
            q = q.bind(limit);
        }
        if let Some(skip) = query.skip {
            q = q.bind(skip);
        }

        q.fetch_all(pool).await
    }

    /// Applies a partial update to a task, only if the caller owns it
    ///
    /// # Returns
    ///
    /// The updated task, or None when no task with this id belongs to the
    /// owner (missing and not-owned are indistinguishable).
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sql = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if changes.description.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", description = ${}", bind_count));
        }
        if changes.completed.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", completed = ${}", bind_count));
        }

        sql.push_str(
            " WHERE id = $1 AND owner = $2 \
             RETURNING id, description, completed, owner, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(id).bind(owner);

        if let Some(description) = changes.description {
            q = q.bind(description);
        }
        if let Some(completed) = changes.completed {
            q = q.bind(completed);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task, only if the caller owns it
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task belonging to an owner
    ///
    /// Used both by the bulk-delete endpoint and by account deletion, where
    /// it runs eagerly before the user row is removed.
    ///
    /// # Returns
    ///
    /// Number of tasks deleted
    pub async fn delete_all_owned(pool: &PgPool, owner: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner = $1")
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
