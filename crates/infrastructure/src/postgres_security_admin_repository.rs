use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use fleetdesk_application::{CreatePermissionInput, RolePermissions, SecurityAdminRepository};
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{PermissionGrant, RoleName};

/// PostgreSQL-backed repository for catalog and grant administration.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role_name: String,
    permission_name: Option<String>,
    resource: Option<String>,
    action: Option<String>,
    description: Option<String>,
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
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn list_role_permissions(&self) -> AppResult<Vec<RolePermissions>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                roles.name AS role_name,
                permissions.name AS permission_name,
                permissions.resource,
                permissions.action,
                permissions.description
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            ORDER BY roles.name, permissions.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role grants: {error}")))?;

        aggregate_role_permissions(rows)
    }

    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT name, resource, action, description
            FROM permissions
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        Ok(rows.into_iter().map(PermissionGrant::from).collect())
    }

    async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<PermissionGrant> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (name, resource, action, description)
            VALUES ($1, $2, $3, $4)
            RETURNING name, resource, action, description
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.resource.as_str())
        .bind(input.action.as_str())
        .bind(input.description.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_permission_conflict(error, input.name.as_str()))?;

        Ok(PermissionGrant::from(row))
    }

    async fn grant_permission_to_role(
        &self,
        role: RoleName,
        permission_name: &str,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(role.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role}' was not found")))?;

        let permission_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM permissions
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(permission_name)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve permission: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("permission '{permission_name}' was not found"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert grant: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn revoke_permission_from_role(
        &self,
        role: RoleName,
        permission_name: &str,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM role_permissions
            USING roles, permissions
            WHERE role_permissions.role_id = roles.id
                AND role_permissions.permission_id = permissions.id
                AND roles.name = $1
                AND permissions.name = $2
            "#,
        )
        .bind(role.as_str())
        .bind(permission_name)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke grant: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "grant '{role}:{permission_name}' was not found"
            )));
        }

        Ok(())
    }
}

fn aggregate_role_permissions(rows: Vec<RoleGrantRow>) -> AppResult<Vec<RolePermissions>> {
    let mut by_role: HashMap<RoleName, Vec<PermissionGrant>> = HashMap::new();

    for row in rows {
        let role = RoleName::from_str(row.role_name.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored role '{}': {error}", row.role_name))
        })?;

        let grants = by_role.entry(role).or_default();
        if let (Some(name), Some(resource), Some(action)) =
            (row.permission_name, row.resource, row.action)
        {
            grants.push(PermissionGrant {
                name,
                resource,
                action,
                description: row.description,
            });
        }
    }

    let mut roles = by_role
        .into_iter()
        .map(|(role, permissions)| RolePermissions { role, permissions })
        .collect::<Vec<_>>();
    roles.sort_by_key(|entry| entry.role.as_str());
    Ok(roles)
}

fn map_permission_conflict(error: sqlx::Error, permission_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "permission '{permission_name}' already exists"
        ));
    }

    AppError::Internal(format!("failed to create permission: {error}"))
}
