use fleetdesk_application::{CommentRecord, PostRecord};
use fleetdesk_domain::Principal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for post creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-post-request.ts"
)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
}

/// Incoming payload for partial post updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-post-request.ts"
)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Incoming payload for comment creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-comment-request.ts"
)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// API representation of a post.
///
/// `editable` is the one field that differs between anonymous and
/// authenticated readers: it reflects whether the current caller could
/// mutate the post.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/post-response.ts"
)]
pub struct PostResponse {
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub editable: bool,
}

impl PostResponse {
    /// Maps a record for the given (possibly anonymous) caller.
    pub fn for_caller(value: PostRecord, caller: Option<&Principal>) -> Self {
        let editable =
            caller.is_some_and(|principal| principal.is_owner_or_privileged(value.author_id));

        Self {
            post_id: value.post_id.to_string(),
            author_id: value.author_id.to_string(),
            author_username: value.author_username,
            title: value.title,
            body: value.body,
            created_at: value.created_at.to_rfc3339(),
            editable,
        }
    }
}

/// API representation of a comment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/comment-response.ts"
)]
pub struct CommentResponse {
    pub comment_id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub body: String,
    pub created_at: String,
}

impl From<CommentRecord> for CommentResponse {
    fn from(value: CommentRecord) -> Self {
        Self {
            comment_id: value.comment_id.to_string(),
            post_id: value.post_id.to_string(),
            author_id: value.author_id.to_string(),
            author_username: value.author_username,
            body: value.body,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}
