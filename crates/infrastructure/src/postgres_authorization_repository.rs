use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use fleetdesk_application::AuthorizationRepository;
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{PermissionGrant, RoleName};

/// PostgreSQL-backed permission loader.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    name: String,
    resource: String,
    action: String,
    description: Option<String>,
}

impl From<PermissionRow> for PermissionGrant {
    fn from(row: PermissionRow) -> Self {
        Self {
            name: row.name,
            resource: row.resource,
            action: row.action,
            description: row.description,
        }
    }
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_role(&self, role: RoleName) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT
                permissions.name,
                permissions.resource,
                permissions.action,
                permissions.description
            FROM role_permissions
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            INNER JOIN roles
                ON roles.id = role_permissions.role_id
            WHERE roles.name = $1
            ORDER BY permissions.name
            "#,
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load permissions for role '{role}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(PermissionGrant::from).collect())
    }
}
