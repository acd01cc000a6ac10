use fleetdesk_application::{GrantSyncStatus, RolePermissions};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::PermissionResponse;

/// Incoming payload for adding a permission to the catalog.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

/// Incoming payload for granting or revoking a role permission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-grant-request.ts"
)]
pub struct RoleGrantRequest {
    pub role: String,
    pub permission: String,
}

/// API representation of a role with its grants.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-permissions-response.ts"
)]
pub struct RolePermissionsResponse {
    pub role: String,
    pub permissions: Vec<PermissionResponse>,
}

impl From<RolePermissions> for RolePermissionsResponse {
    fn from(value: RolePermissions) -> Self {
        Self {
            role: value.role.as_str().to_owned(),
            permissions: value
                .permissions
                .into_iter()
                .map(PermissionResponse::from)
                .collect(),
        }
    }
}

/// API representation of superadmin grant drift.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-sync-status-response.ts"
)]
pub struct GrantSyncStatusResponse {
    pub total_permissions: i64,
    pub granted: i64,
    pub missing: i64,
    pub state: String,
}

impl From<GrantSyncStatus> for GrantSyncStatusResponse {
    fn from(value: GrantSyncStatus) -> Self {
        Self {
            total_permissions: value.total_permissions,
            granted: value.granted,
            missing: value.missing,
            state: value.state.as_str().to_owned(),
        }
    }
}

/// API representation of a reconcile run.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/reconcile-response.ts"
)]
pub struct ReconcileResponse {
    pub inserted: i64,
    pub status: GrantSyncStatusResponse,
}
