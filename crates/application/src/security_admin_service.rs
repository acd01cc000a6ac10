use std::sync::Arc;

use async_trait::async_trait;

use fleetdesk_core::{AppError, AppResult, NonEmptyString};
use fleetdesk_domain::{PermissionGrant, Principal, RoleName};

use crate::access_policy;
use crate::grant_reconciliation_service::CatalogChangeNotifier;
use crate::permissions;

/// A role together with its effective grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissions {
    /// Role name.
    pub role: RoleName,
    /// Distinct permissions granted to the role.
    pub permissions: Vec<PermissionGrant>,
}

/// Input payload for adding a permission to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Unique permission name, conventionally `resource.action`.
    pub name: String,
    /// Resource the permission applies to.
    pub resource: String,
    /// Action allowed on the resource.
    pub action: String,
    /// Optional human-readable description.
    pub description: Option<String>,
}

/// Repository port for catalog and grant administration.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Lists every role with its effective grants.
    async fn list_role_permissions(&self) -> AppResult<Vec<RolePermissions>>;

    /// Lists the full permission catalog.
    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionGrant>>;

    /// Inserts a permission into the catalog.
    async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<PermissionGrant>;

    /// Grants a catalog permission to a role (insert-if-absent).
    async fn grant_permission_to_role(
        &self,
        role: RoleName,
        permission_name: &str,
    ) -> AppResult<()>;

    /// Removes a grant from a role.
    async fn revoke_permission_from_role(
        &self,
        role: RoleName,
        permission_name: &str,
    ) -> AppResult<()>;
}

/// Application service for permission catalog and grant administration.
#[derive(Clone)]
pub struct SecurityAdminService {
    repository: Arc<dyn SecurityAdminRepository>,
    catalog_notifier: Arc<dyn CatalogChangeNotifier>,
}

impl SecurityAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn SecurityAdminRepository>,
        catalog_notifier: Arc<dyn CatalogChangeNotifier>,
    ) -> Self {
        Self {
            repository,
            catalog_notifier,
        }
    }

    /// Returns roles with their grants.
    pub async fn list_role_permissions(
        &self,
        actor: &Principal,
    ) -> AppResult<Vec<RolePermissions>> {
        access_policy::require_permission(actor, permissions::SECURITY_ROLE_READ)?;

        self.repository.list_role_permissions().await
    }

    /// Returns the full permission catalog.
    pub async fn list_permission_catalog(
        &self,
        actor: &Principal,
    ) -> AppResult<Vec<PermissionGrant>> {
        access_policy::require_permission(actor, permissions::SECURITY_ROLE_READ)?;

        self.repository.list_permission_catalog().await
    }

    /// Adds a permission to the catalog and signals the catalog change.
    ///
    /// The notification is fire-and-forget; the reconciliation listener
    /// closes the resulting superadmin drift window.
    pub async fn create_permission(
        &self,
        actor: &Principal,
        input: CreatePermissionInput,
    ) -> AppResult<PermissionGrant> {
        access_policy::require_permission(actor, permissions::SECURITY_ROLE_MANAGE)?;

        let name = NonEmptyString::new(input.name)?;
        let resource = NonEmptyString::new(input.resource)?;
        let action = NonEmptyString::new(input.action)?;

        let created = self
            .repository
            .create_permission(CreatePermissionInput {
                name: name.into(),
                resource: resource.into(),
                action: action.into(),
                description: input.description,
            })
            .await?;

        self.catalog_notifier.notify();

        Ok(created)
    }

    /// Grants a catalog permission to a role.
    pub async fn grant_permission(
        &self,
        actor: &Principal,
        role: RoleName,
        permission_name: &str,
    ) -> AppResult<()> {
        access_policy::require_permission(actor, permissions::SECURITY_ROLE_MANAGE)?;

        self.repository
            .grant_permission_to_role(role, permission_name)
            .await
    }

    /// Revokes a grant from a role.
    ///
    /// Superadmin grants cannot be revoked: the reconciler would re-create
    /// the row on its next run, so the request is rejected up front.
    pub async fn revoke_permission(
        &self,
        actor: &Principal,
        role: RoleName,
        permission_name: &str,
    ) -> AppResult<()> {
        access_policy::require_permission(actor, permissions::SECURITY_ROLE_MANAGE)?;

        if role == RoleName::Superadmin {
            return Err(AppError::Validation(
                "superadmin grants are maintained by the reconciler and cannot be revoked"
                    .to_owned(),
            ));
        }

        self.repository
            .revoke_permission_from_role(role, permission_name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use fleetdesk_core::{AppError, AppResult};
    use fleetdesk_domain::{PermissionGrant, PermissionSet, Principal, RoleName, UserId};

    use crate::grant_reconciliation_service::CatalogChangeNotifier;
    use crate::permissions;

    use super::{
        CreatePermissionInput, RolePermissions, SecurityAdminRepository, SecurityAdminService,
    };

    #[derive(Default)]
    struct FakeSecurityAdminRepository {
        catalog: Mutex<Vec<PermissionGrant>>,
        grants: Mutex<Vec<(RoleName, String)>>,
    }

    #[async_trait]
    impl SecurityAdminRepository for FakeSecurityAdminRepository {
        async fn list_role_permissions(&self) -> AppResult<Vec<RolePermissions>> {
            Ok(Vec::new())
        }

        async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionGrant>> {
            Ok(self.catalog.lock().await.clone())
        }

        async fn create_permission(
            &self,
            input: CreatePermissionInput,
        ) -> AppResult<PermissionGrant> {
            let created = PermissionGrant {
                name: input.name,
                resource: input.resource,
                action: input.action,
                description: input.description,
            };
            self.catalog.lock().await.push(created.clone());
            Ok(created)
        }

        async fn grant_permission_to_role(
            &self,
            role: RoleName,
            permission_name: &str,
        ) -> AppResult<()> {
            self.grants
                .lock()
                .await
                .push((role, permission_name.to_owned()));
            Ok(())
        }

        async fn revoke_permission_from_role(
            &self,
            role: RoleName,
            permission_name: &str,
        ) -> AppResult<()> {
            self.grants
                .lock()
                .await
                .retain(|(stored_role, stored_name)| {
                    !(*stored_role == role && stored_name == permission_name)
                });
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        notifications: AtomicUsize,
    }

    impl CatalogChangeNotifier for CountingNotifier {
        fn notify(&self) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn actor(names: &[&str]) -> Principal {
        let grants = names
            .iter()
            .map(|name| PermissionGrant {
                name: (*name).to_owned(),
                resource: String::new(),
                action: String::new(),
                description: None,
            })
            .collect();
        Principal::new(
            UserId::new(),
            "secops",
            "secops@example.com",
            RoleName::Admin,
            PermissionSet::new(grants),
        )
    }

    fn service() -> (SecurityAdminService, Arc<CountingNotifier>) {
        let notifier = Arc::new(CountingNotifier::default());
        let service = SecurityAdminService::new(
            Arc::new(FakeSecurityAdminRepository::default()),
            notifier.clone(),
        );
        (service, notifier)
    }

    fn permission_input(name: &str) -> CreatePermissionInput {
        let (resource, action) = name.split_once('.').unwrap_or((name, "read"));
        CreatePermissionInput {
            name: name.to_owned(),
            resource: resource.to_owned(),
            action: action.to_owned(),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_permission_requires_manage_permission() {
        let (service, notifier) = service();
        let actor = actor(&[permissions::SECURITY_ROLE_READ]);

        let result = service
            .create_permission(&actor, permission_input("reports.read"))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(notifier.notifications.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_permission_fires_catalog_change_notification() {
        let (service, notifier) = service();
        let actor = actor(&[permissions::SECURITY_ROLE_MANAGE]);

        let result = service
            .create_permission(&actor, permission_input("reports.read"))
            .await;

        assert!(result.is_ok());
        assert_eq!(notifier.notifications.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_permission_rejects_blank_fields() {
        let (service, notifier) = service();
        let actor = actor(&[permissions::SECURITY_ROLE_MANAGE]);

        let result = service
            .create_permission(
                &actor,
                CreatePermissionInput {
                    name: "  ".to_owned(),
                    resource: "reports".to_owned(),
                    action: "read".to_owned(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(notifier.notifications.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn revoking_a_superadmin_grant_is_rejected() {
        let (service, _) = service();
        let actor = actor(&[permissions::SECURITY_ROLE_MANAGE]);

        let result = service
            .revoke_permission(&actor, RoleName::Superadmin, "bookings.read")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn listing_requires_read_permission() {
        let (service, _) = service();
        let actor = actor(&[]);

        let result = service.list_role_permissions(&actor).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
