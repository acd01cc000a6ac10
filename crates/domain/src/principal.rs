use crate::{PermissionSet, RoleName, UserId};

/// The authenticated caller for the duration of one request.
///
/// Built fresh from store state at verification time, never persisted, and
/// discarded when the request ends. All predicate checks are pure lookups
/// over the resolved permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    username: String,
    email: String,
    role: RoleName,
    permissions: PermissionSet,
}

impl Principal {
    /// Creates a principal from identity data and a resolved permission set.
    #[must_use]
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        role: RoleName,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            email: email.into(),
            role,
            permissions,
        }
    }

    /// Returns the caller's user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the caller's username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the caller's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the caller's role.
    #[must_use]
    pub fn role(&self) -> RoleName {
        self.role
    }

    /// Returns the caller's resolved permission set.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether the caller's role is one of the given roles.
    #[must_use]
    pub fn has_role(&self, roles: &[RoleName]) -> bool {
        roles.contains(&self.role)
    }

    /// Returns whether a permission with exactly this name is held.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains_name(name)
    }

    /// Returns whether a permission with exactly this resource/action pair is held.
    #[must_use]
    pub fn has_resource_permission(&self, resource: &str, action: &str) -> bool {
        self.permissions.contains_pair(resource, action)
    }

    /// Returns whether at least one of the named permissions is held.
    #[must_use]
    pub fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_permission(name))
    }

    /// Returns whether every named permission is held.
    #[must_use]
    pub fn has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_permission(name))
    }

    /// Returns whether the caller owns the resource or holds a privileged role.
    #[must_use]
    pub fn is_owner_or_privileged(&self, owner_id: UserId) -> bool {
        self.role.is_privileged() || self.user_id == owner_id
    }
}
