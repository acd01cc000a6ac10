use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;

use fleetdesk_application::{
    CreatePermissionInput, permissions, require_permission,
};
use fleetdesk_domain::{Principal, RoleName};

use crate::dto::{
    CreatePermissionRequest, GrantSyncStatusResponse, PermissionResponse, ReconcileResponse,
    RoleGrantRequest, RolePermissionsResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<RolePermissionsResponse>>> {
    let roles = state
        .security_admin_service
        .list_role_permissions(&principal)
        .await?
        .into_iter()
        .map(RolePermissionsResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let catalog = state
        .security_admin_service
        .list_permission_catalog(&principal)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(catalog))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let created = state
        .security_admin_service
        .create_permission(
            &principal,
            CreatePermissionInput {
                name: payload.name,
                resource: payload.resource,
                action: payload.action,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(created))))
}

pub async fn grant_role_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<RoleGrantRequest>,
) -> ApiResult<StatusCode> {
    let role = RoleName::from_str(payload.role.as_str())?;

    state
        .security_admin_service
        .grant_permission(&principal, role, payload.permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_role_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<RoleGrantRequest>,
) -> ApiResult<StatusCode> {
    let role = RoleName::from_str(payload.role.as_str())?;

    state
        .security_admin_service
        .revoke_permission(&principal, role, payload.permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn superadmin_sync_status_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<GrantSyncStatusResponse>> {
    require_permission(&principal, permissions::SECURITY_ROLE_READ)?;

    let status = state.grant_reconciliation_service.status().await?;

    Ok(Json(GrantSyncStatusResponse::from(status)))
}

pub async fn superadmin_sync_reconcile_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ReconcileResponse>> {
    require_permission(&principal, permissions::SECURITY_ROLE_MANAGE)?;

    let inserted = state.grant_reconciliation_service.reconcile().await?;
    let status = state.grant_reconciliation_service.status().await?;

    Ok(Json(ReconcileResponse {
        inserted: i64::try_from(inserted).unwrap_or(i64::MAX),
        status: GrantSyncStatusResponse::from(status),
    }))
}
