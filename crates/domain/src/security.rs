use std::collections::HashSet;
use std::str::FromStr;

use fleetdesk_core::AppError;
use serde::{Deserialize, Serialize};

/// Role names recognized by authorization checks.
///
/// Roles form a small closed set; unknown role strings are rejected at parse
/// time instead of flowing through as free-form values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Privileged role whose grant set must always cover the full catalog.
    Superadmin,
    /// Administrative role with broad access.
    Admin,
    /// Operational role for day-to-day fleet management.
    Manager,
    /// Basic authenticated user.
    User,
}

impl RoleName {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::User => "user",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleName] = &[
            RoleName::Superadmin,
            RoleName::Admin,
            RoleName::Manager,
            RoleName::User,
        ];

        ALL
    }

    /// Returns whether this role bypasses ownership checks.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Superadmin | Self::Admin)
    }
}

impl FromStr for RoleName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "superadmin" => Ok(Self::Superadmin),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A permission granted to a role, resolved from the catalog.
///
/// The catalog is dynamic: rows are added by migrations, seeds, or the
/// security admin surface, so permissions are records rather than a closed
/// enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Unique permission name, conventionally `resource.action`.
    pub name: String,
    /// Resource the permission applies to.
    pub resource: String,
    /// Action allowed on the resource.
    pub action: String,
    /// Optional human-readable description.
    pub description: Option<String>,
}

/// Resolved permission set with constant-time membership checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    grants: Vec<PermissionGrant>,
    names: HashSet<String>,
    pairs: HashSet<(String, String)>,
}

impl PermissionSet {
    /// Builds a permission set, de-duplicating grants by name.
    #[must_use]
    pub fn new(grants: Vec<PermissionGrant>) -> Self {
        let mut deduplicated: Vec<PermissionGrant> = Vec::with_capacity(grants.len());
        let mut names = HashSet::with_capacity(grants.len());
        let mut pairs = HashSet::with_capacity(grants.len());

        for grant in grants {
            if names.insert(grant.name.clone()) {
                pairs.insert((grant.resource.clone(), grant.action.clone()));
                deduplicated.push(grant);
            }
        }

        Self {
            grants: deduplicated,
            names,
            pairs,
        }
    }

    /// Returns an empty permission set.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns whether a permission with exactly this name is present.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns whether a permission with exactly this resource/action pair is present.
    #[must_use]
    pub fn contains_pair(&self, resource: &str, action: &str) -> bool {
        self.pairs
            .contains(&(resource.to_owned(), action.to_owned()))
    }

    /// Returns the de-duplicated grants backing this set.
    #[must_use]
    pub fn grants(&self) -> &[PermissionGrant] {
        &self.grants
    }

    /// Returns the number of distinct permissions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Returns whether the set holds no permissions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
