use fleetdesk_application::UserRecord;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for account creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-user-request.ts"
)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Incoming payload for role changes.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-user-role-request.ts"
)]
pub struct UpdateUserRoleRequest {
    pub role: String,
}

/// API representation of a user account. Never carries the password hash.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(value: UserRecord) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            username: value.username,
            email: value.email,
            role: value.role.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}
