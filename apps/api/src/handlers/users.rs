use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use fleetdesk_application::CreateUserInput;
use fleetdesk_domain::{Principal, RoleName, UserId};

use crate::dto::{CreateUserRequest, UpdateUserRoleRequest, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state
        .user_admin_service
        .list(&principal)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<uuid::Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .user_admin_service
        .get(&principal, UserId::from_uuid(user_id))
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role = RoleName::from_str(payload.role.as_str())?;

    let user = state
        .user_admin_service
        .create(
            &principal,
            CreateUserInput {
                username: payload.username,
                email: payload.email,
                password: payload.password,
                role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn update_user_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let role = RoleName::from_str(payload.role.as_str())?;

    let user = state
        .user_admin_service
        .update_role(&principal, UserId::from_uuid(user_id), role)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_admin_service
        .delete(&principal, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
