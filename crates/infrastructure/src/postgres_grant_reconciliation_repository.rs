#[cfg(test)]
mod tests;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use fleetdesk_application::{GrantReconciliationRepository, GrantSyncState, GrantSyncStatus};
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::RoleName;

/// PostgreSQL-backed grant reconciliation.
///
/// All writes are insert-if-absent over the `(role_id, permission_id)`
/// uniqueness constraint, which is the only synchronization mechanism:
/// concurrent reconcilers race harmlessly.
#[derive(Clone)]
pub struct PostgresGrantReconciliationRepository {
    pool: PgPool,
}

impl PostgresGrantReconciliationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantStatusRow {
    total_permissions: i64,
    superadmin_permissions: i64,
    missing_permissions: i64,
}

#[async_trait]
impl GrantReconciliationRepository for PostgresGrantReconciliationRepository {
    async fn grant_status(&self) -> AppResult<GrantSyncStatus> {
        let row = sqlx::query_as::<_, GrantStatusRow>(
            r#"
            SELECT total_permissions, superadmin_permissions, missing_permissions
            FROM superadmin_grant_status
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read superadmin grant status: {error}"))
        })?;

        Ok(GrantSyncStatus {
            total_permissions: row.total_permissions,
            granted: row.superadmin_permissions,
            missing: row.missing_permissions,
            state: if row.missing_permissions == 0 {
                GrantSyncState::Complete
            } else {
                GrantSyncState::Incomplete
            },
        })
    }

    async fn insert_missing_grants(&self) -> AppResult<u64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT roles.id, permissions.id
            FROM roles
            CROSS JOIN permissions
            WHERE roles.name = $1
                AND NOT EXISTS (
                    SELECT 1
                    FROM role_permissions AS granted
                    WHERE granted.role_id = roles.id
                        AND granted.permission_id = permissions.id
                )
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(RoleName::Superadmin.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_grant_insert_error)?
        .rows_affected();

        Ok(inserted)
    }

    async fn grant_all_permissions(&self) -> AppResult<u64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT roles.id, permissions.id
            FROM roles
            CROSS JOIN permissions
            WHERE roles.name = $1
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(RoleName::Superadmin.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_grant_insert_error)?
        .rows_affected();

        Ok(inserted)
    }
}

/// `ON CONFLICT DO NOTHING` absorbs racing inserts, so a unique violation
/// should not surface here; when one does anyway it still means "already
/// granted" and is mapped to `Conflict` for the service to fold into success.
fn map_grant_insert_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("grant row already exists".to_owned());
    }

    AppError::Internal(format!("failed to insert superadmin grants: {error}"))
}
