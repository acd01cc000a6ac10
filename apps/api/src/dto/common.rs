use fleetdesk_domain::PermissionGrant;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of a permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

impl From<PermissionGrant> for PermissionResponse {
    fn from(value: PermissionGrant) -> Self {
        Self {
            name: value.name,
            resource: value.resource,
            action: value.action,
            description: value.description,
        }
    }
}
