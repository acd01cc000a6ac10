use axum::Json;
use axum::extract::{Extension, State};

use fleetdesk_domain::Principal;

use crate::dto::{LoginRequest, PrincipalResponse, TokenResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let issued = state
        .identity_service
        .login(payload.identifier.as_str(), payload.password.as_str())
        .await?;

    Ok(Json(TokenResponse::from(issued)))
}

pub async fn me_handler(
    Extension(principal): Extension<Principal>,
) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(&principal))
}
