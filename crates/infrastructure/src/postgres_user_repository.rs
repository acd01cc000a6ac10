use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use fleetdesk_application::{NewUserRecord, UserRecord, UserRepository};
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{RoleName, UserId};

/// PostgreSQL-backed repository for user account rows.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    username: String,
    email: String,
    role_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = RoleName::from_str(row.role_name.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored role '{}' for user '{}': {error}",
                row.role_name, row.id
            ))
        })?;

        Ok(Self {
            user_id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = r#"
    users.id,
    users.username,
    users.email,
    roles.name AS role_name,
    users.password_hash,
    users.created_at
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            INNER JOIN roles ON roles.id = users.role_id
            ORDER BY users.username
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            INNER JOIN roles ON roles.id = users.role_id
            WHERE users.id = $1
            LIMIT 1
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by id: {error}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            INNER JOIN roles ON roles.id = users.role_id
            WHERE users.username = $1 OR LOWER(users.email) = LOWER($1)
            LIMIT 1
            "#
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find user by identifier: {error}"))
        })?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn insert(&self, record: NewUserRecord) -> AppResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash, role_id)
            SELECT $1, $2, $3, roles.id
            FROM roles
            WHERE roles.name = $4
            RETURNING
                users.id,
                users.username,
                users.email,
                $4::text AS role_name,
                users.password_hash,
                users.created_at
            "#,
        )
        .bind(record.username.as_str())
        .bind(record.email.as_str())
        .bind(record.password_hash.as_str())
        .bind(record.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_user_conflict(error, record.username.as_str()))?
        .ok_or_else(|| {
            AppError::Internal(format!("role '{}' is not provisioned", record.role))
        })?;

        UserRecord::try_from(row)
    }

    async fn update_role(&self, user_id: UserId, role: RoleName) -> AppResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET role_id = roles.id
            FROM roles
            WHERE users.id = $1 AND roles.name = $2
            RETURNING
                users.id,
                users.username,
                users.email,
                $2::text AS role_name,
                users.password_hash,
                users.created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update user role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))?;

        UserRecord::try_from(row)
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let rows_affected = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete user: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' was not found"
            )));
        }

        Ok(())
    }
}

fn map_user_conflict(error: sqlx::Error, username: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "username or email for '{username}' is already taken"
        ));
    }

    AppError::Internal(format!("failed to insert user: {error}"))
}
