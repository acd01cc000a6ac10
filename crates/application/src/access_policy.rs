//! Authorization guard predicates over a request-scoped [`Principal`].
//!
//! Every check that fails names the unmet requirement in its error message;
//! callers and tests rely on that content. A missing principal always maps
//! to `Unauthorized` (401), never `Forbidden` (403): the two answers "who
//! are you" and "you may not" are kept strictly apart.

use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{Principal, RoleName, UserId};

/// Returns the principal, or `Unauthorized` when none is attached.
pub fn require_principal(principal: Option<&Principal>) -> AppResult<&Principal> {
    principal.ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
}

/// Ensures the principal's role is one of the given roles.
pub fn require_role(principal: &Principal, roles: &[RoleName]) -> AppResult<()> {
    if principal.has_role(roles) {
        return Ok(());
    }

    let allowed = roles
        .iter()
        .map(RoleName::as_str)
        .collect::<Vec<_>>()
        .join("', '");
    Err(AppError::Forbidden(format!(
        "requires one of roles '{allowed}'"
    )))
}

/// Ensures the principal holds a permission with exactly this name.
pub fn require_permission(principal: &Principal, name: &str) -> AppResult<()> {
    if principal.has_permission(name) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "missing required permission '{name}'"
    )))
}

/// Ensures the principal holds a permission with exactly this resource/action pair.
pub fn require_resource_permission(
    principal: &Principal,
    resource: &str,
    action: &str,
) -> AppResult<()> {
    if principal.has_resource_permission(resource, action) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "missing required permission '{resource}.{action}'"
    )))
}

/// Ensures the principal holds at least one of the named permissions.
pub fn require_any(principal: &Principal, names: &[&str]) -> AppResult<()> {
    if principal.has_any(names) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "requires at least one of permissions '{}'",
        names.join("', '")
    )))
}

/// Ensures the principal holds every named permission.
pub fn require_all(principal: &Principal, names: &[&str]) -> AppResult<()> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !principal.has_permission(name))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "missing required permissions '{}'",
        missing.join("', '")
    )))
}

/// Ensures the principal owns the resource or holds a privileged role.
pub fn require_owner_or_privileged(principal: &Principal, owner_id: UserId) -> AppResult<()> {
    if principal.is_owner_or_privileged(owner_id) {
        return Ok(());
    }

    Err(AppError::Forbidden(
        "only the resource owner or an administrator may perform this action".to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use fleetdesk_core::AppError;
    use fleetdesk_domain::{PermissionGrant, PermissionSet, Principal, RoleName, UserId};

    use super::{
        require_all, require_any, require_owner_or_privileged, require_permission,
        require_principal, require_resource_permission, require_role,
    };

    fn grant(name: &str) -> PermissionGrant {
        let (resource, action) = name.split_once('.').unwrap_or((name, ""));
        PermissionGrant {
            name: name.to_owned(),
            resource: resource.to_owned(),
            action: action.to_owned(),
            description: None,
        }
    }

    fn principal(role: RoleName, names: &[&str]) -> Principal {
        Principal::new(
            UserId::new(),
            "casey",
            "casey@example.com",
            role,
            PermissionSet::new(names.iter().map(|name| grant(name)).collect()),
        )
    }

    #[test]
    fn absent_principal_is_unauthorized_not_forbidden() {
        let result = require_principal(None);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn missing_permission_error_names_the_permission() {
        let principal = principal(RoleName::User, &[]);
        let result = require_permission(&principal, "bookings.create");

        let Err(AppError::Forbidden(message)) = result else {
            panic!("expected forbidden error");
        };
        assert!(message.contains("bookings.create"));
    }

    #[test]
    fn missing_role_error_names_the_roles() {
        let principal = principal(RoleName::User, &[]);
        let result = require_role(&principal, &[RoleName::Admin, RoleName::Superadmin]);

        let Err(AppError::Forbidden(message)) = result else {
            panic!("expected forbidden error");
        };
        assert!(message.contains("admin"));
        assert!(message.contains("superadmin"));
    }

    #[test]
    fn resource_permission_near_miss_is_forbidden() {
        let principal = principal(RoleName::User, &["bookings.create"]);

        assert!(require_resource_permission(&principal, "bookings", "create").is_ok());
        let result = require_resource_permission(&principal, "bookings", "update");
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn require_all_lists_every_missing_permission() {
        let principal = principal(RoleName::User, &["bookings.read"]);
        let result = require_all(&principal, &["bookings.read", "bookings.update", "users.read"]);

        let Err(AppError::Forbidden(message)) = result else {
            panic!("expected forbidden error");
        };
        assert!(message.contains("bookings.update"));
        assert!(message.contains("users.read"));
        assert!(!message.contains("bookings.read'"));
    }

    #[test]
    fn require_any_accepts_a_single_match() {
        let principal = principal(RoleName::User, &["posts.create"]);
        assert!(require_any(&principal, &["posts.update", "posts.create"]).is_ok());
        assert!(require_any(&principal, &["posts.update", "posts.delete"]).is_err());
    }

    #[test]
    fn ownership_check_passes_for_owner_and_privileged_roles() {
        let owner = principal(RoleName::User, &[]);
        assert!(require_owner_or_privileged(&owner, owner.user_id()).is_ok());

        let other = UserId::new();
        assert!(matches!(
            require_owner_or_privileged(&owner, other),
            Err(AppError::Forbidden(_))
        ));

        let admin = principal(RoleName::Admin, &[]);
        assert!(require_owner_or_privileged(&admin, other).is_ok());
    }
}
