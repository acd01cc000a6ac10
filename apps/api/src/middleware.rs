use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use fleetdesk_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Mandatory authentication: any verification failure aborts with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = state
        .identity_service
        .authenticate(bearer_token(request.headers()))
        .await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Optional authentication: verification failures are swallowed and the
/// request proceeds with no principal attached. Store failures still
/// propagate as 500s — an unreachable database is not an anonymous caller.
///
/// Handlers under this layer extract `Extension<Option<Principal>>`; the
/// extension is always present, the principal only for verified callers.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = match state
        .identity_service
        .authenticate(bearer_token(request.headers()))
        .await
    {
        Ok(principal) => Some(principal),
        Err(AppError::Unauthorized(_)) => None,
        Err(error) => return Err(error.into()),
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extracts the bearer token from the Authorization header.
///
/// A missing header, a non-UTF-8 value, and a non-Bearer scheme all read as
/// "no token presented".
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
