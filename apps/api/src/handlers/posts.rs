use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use fleetdesk_application::{CreatePostInput, UpdatePostInput, require_principal};
use fleetdesk_domain::{CommentId, PostId, Principal};

use crate::dto::{
    CommentResponse, CreateCommentRequest, CreatePostRequest, PostResponse, UpdatePostRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

// The whole area runs under optional auth: reads serve anonymous callers,
// mutations demand a principal and answer 401 when none is attached.

pub async fn list_posts_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
) -> ApiResult<Json<Vec<PostResponse>>> {
    let posts = state
        .content_service
        .list_posts()
        .await?
        .into_iter()
        .map(|post| PostResponse::for_caller(post, principal.as_ref()))
        .collect();

    Ok(Json(posts))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
    Path(post_id): Path<uuid::Uuid>,
) -> ApiResult<Json<PostResponse>> {
    let post = state
        .content_service
        .get_post(PostId::from_uuid(post_id))
        .await?;

    Ok(Json(PostResponse::for_caller(post, principal.as_ref())))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    let caller = require_principal(principal.as_ref())?;

    let post = state
        .content_service
        .create_post(
            caller,
            CreatePostInput {
                title: payload.title,
                body: payload.body,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::for_caller(post, Some(caller))),
    ))
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
    Path(post_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<PostResponse>> {
    let caller = require_principal(principal.as_ref())?;

    let post = state
        .content_service
        .update_post(
            caller,
            PostId::from_uuid(post_id),
            UpdatePostInput {
                title: payload.title,
                body: payload.body,
            },
        )
        .await?;

    Ok(Json(PostResponse::for_caller(post, Some(caller))))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
    Path(post_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    let caller = require_principal(principal.as_ref())?;

    state
        .content_service
        .delete_post(caller, PostId::from_uuid(post_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<uuid::Uuid>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let comments = state
        .content_service
        .list_comments(PostId::from_uuid(post_id))
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();

    Ok(Json(comments))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
    Path(post_id): Path<uuid::Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let caller = require_principal(principal.as_ref())?;

    let comment = state
        .content_service
        .create_comment(caller, PostId::from_uuid(post_id), payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Option<Principal>>,
    Path(comment_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    let caller = require_principal(principal.as_ref())?;

    state
        .content_service
        .delete_comment(caller, CommentId::from_uuid(comment_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
