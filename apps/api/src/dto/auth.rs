use fleetdesk_application::IssuedAccessToken;
use fleetdesk_domain::Principal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::PermissionResponse;

/// Incoming payload for login.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// API representation of an issued access token.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/token-response.ts"
)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: String,
}

impl From<IssuedAccessToken> for TokenResponse {
    fn from(value: IssuedAccessToken) -> Self {
        Self {
            token: value.token,
            expires_at: value.expires_at.to_rfc3339(),
        }
    }
}

/// API representation of the authenticated principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/principal-response.ts"
)]
pub struct PrincipalResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<PermissionResponse>,
}

impl From<&Principal> for PrincipalResponse {
    fn from(value: &Principal) -> Self {
        Self {
            user_id: value.user_id().to_string(),
            username: value.username().to_owned(),
            email: value.email().to_owned(),
            role: value.role().as_str().to_owned(),
            permissions: value
                .permissions()
                .grants()
                .iter()
                .cloned()
                .map(PermissionResponse::from)
                .collect(),
        }
    }
}
