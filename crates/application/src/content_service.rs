use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fleetdesk_core::{AppError, AppResult, NonEmptyString};
use fleetdesk_domain::{CommentId, PostId, Principal, UserId};

use crate::access_policy;
use crate::permissions;

/// Post row projection returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Stable post identifier.
    pub post_id: PostId,
    /// Authoring user.
    pub author_id: UserId,
    /// Author username resolved for display.
    pub author_username: String,
    /// Post title.
    pub title: String,
    /// Post body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Comment row projection returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    /// Stable comment identifier.
    pub comment_id: CommentId,
    /// Parent post.
    pub post_id: PostId,
    /// Authoring user.
    pub author_id: UserId,
    /// Author username resolved for display.
    pub author_username: String,
    /// Comment body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input payload for post creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostInput {
    /// Post title.
    pub title: String,
    /// Post body.
    pub body: String,
}

/// Partial update payload; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePostInput {
    /// New title.
    pub title: Option<String>,
    /// New body.
    pub body: Option<String>,
}

/// Repository port for post and comment rows.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Lists all posts, newest first.
    async fn list_posts(&self) -> AppResult<Vec<PostRecord>>;

    /// Finds a post by id.
    async fn find_post(&self, post_id: PostId) -> AppResult<Option<PostRecord>>;

    /// Inserts a post.
    async fn insert_post(&self, author: UserId, input: CreatePostInput) -> AppResult<PostRecord>;

    /// Applies a partial update to a post.
    async fn update_post(&self, post_id: PostId, input: UpdatePostInput) -> AppResult<PostRecord>;

    /// Deletes a post together with its comments.
    async fn delete_post(&self, post_id: PostId) -> AppResult<()>;

    /// Lists comments under a post, oldest first.
    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentRecord>>;

    /// Finds a comment by id.
    async fn find_comment(&self, comment_id: CommentId) -> AppResult<Option<CommentRecord>>;

    /// Inserts a comment under a post.
    async fn insert_comment(
        &self,
        post_id: PostId,
        author: UserId,
        body: String,
    ) -> AppResult<CommentRecord>;

    /// Deletes a comment.
    async fn delete_comment(&self, comment_id: CommentId) -> AppResult<()>;
}

/// Application service for posts and comments.
///
/// Reads are public (no principal required); mutations carry permission and
/// ownership checks.
#[derive(Clone)]
pub struct ContentService {
    repository: Arc<dyn ContentRepository>,
}

impl ContentService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// Lists posts. Public.
    pub async fn list_posts(&self) -> AppResult<Vec<PostRecord>> {
        self.repository.list_posts().await
    }

    /// Returns a single post. Public.
    pub async fn get_post(&self, post_id: PostId) -> AppResult<PostRecord> {
        self.find_existing_post(post_id).await
    }

    /// Creates a post authored by the actor.
    pub async fn create_post(
        &self,
        actor: &Principal,
        input: CreatePostInput,
    ) -> AppResult<PostRecord> {
        access_policy::require_permission(actor, permissions::POSTS_CREATE)?;

        let title = NonEmptyString::new(input.title)?;
        let body = NonEmptyString::new(input.body)?;

        self.repository
            .insert_post(
                actor.user_id(),
                CreatePostInput {
                    title: title.into(),
                    body: body.into(),
                },
            )
            .await
    }

    /// Updates a post. The caller must be its author or privileged.
    pub async fn update_post(
        &self,
        actor: &Principal,
        post_id: PostId,
        input: UpdatePostInput,
    ) -> AppResult<PostRecord> {
        access_policy::require_permission(actor, permissions::POSTS_UPDATE)?;

        let existing = self.find_existing_post(post_id).await?;
        access_policy::require_owner_or_privileged(actor, existing.author_id)?;

        if let Some(title) = &input.title {
            NonEmptyString::new(title.as_str())?;
        }
        if let Some(body) = &input.body {
            NonEmptyString::new(body.as_str())?;
        }

        self.repository.update_post(post_id, input).await
    }

    /// Deletes a post. The caller must be its author or privileged.
    pub async fn delete_post(&self, actor: &Principal, post_id: PostId) -> AppResult<()> {
        access_policy::require_permission(actor, permissions::POSTS_DELETE)?;

        let existing = self.find_existing_post(post_id).await?;
        access_policy::require_owner_or_privileged(actor, existing.author_id)?;

        self.repository.delete_post(post_id).await
    }

    /// Lists comments under a post. Public.
    pub async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentRecord>> {
        self.find_existing_post(post_id).await?;

        self.repository.list_comments(post_id).await
    }

    /// Creates a comment under an existing post.
    pub async fn create_comment(
        &self,
        actor: &Principal,
        post_id: PostId,
        body: String,
    ) -> AppResult<CommentRecord> {
        access_policy::require_permission(actor, permissions::COMMENTS_CREATE)?;

        self.find_existing_post(post_id).await?;
        let body = NonEmptyString::new(body)?;

        self.repository
            .insert_comment(post_id, actor.user_id(), body.into())
            .await
    }

    /// Deletes a comment. The caller must be its author or privileged.
    pub async fn delete_comment(&self, actor: &Principal, comment_id: CommentId) -> AppResult<()> {
        access_policy::require_permission(actor, permissions::COMMENTS_DELETE)?;

        let existing = self
            .repository
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment '{comment_id}' was not found")))?;
        access_policy::require_owner_or_privileged(actor, existing.author_id)?;

        self.repository.delete_comment(comment_id).await
    }

    async fn find_existing_post(&self, post_id: PostId) -> AppResult<PostRecord> {
        self.repository
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post '{post_id}' was not found")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;

    use fleetdesk_core::{AppError, AppResult};
    use fleetdesk_domain::{
        CommentId, PermissionGrant, PermissionSet, PostId, Principal, RoleName, UserId,
    };

    use crate::permissions;

    use super::{
        CommentRecord, ContentRepository, ContentService, CreatePostInput, PostRecord,
        UpdatePostInput,
    };

    #[derive(Default)]
    struct FakeContentRepository {
        posts: Mutex<Vec<PostRecord>>,
        comments: Mutex<Vec<CommentRecord>>,
    }

    #[async_trait]
    impl ContentRepository for FakeContentRepository {
        async fn list_posts(&self) -> AppResult<Vec<PostRecord>> {
            Ok(self.posts.lock().await.clone())
        }

        async fn find_post(&self, post_id: PostId) -> AppResult<Option<PostRecord>> {
            Ok(self
                .posts
                .lock()
                .await
                .iter()
                .find(|post| post.post_id == post_id)
                .cloned())
        }

        async fn insert_post(
            &self,
            author: UserId,
            input: CreatePostInput,
        ) -> AppResult<PostRecord> {
            let post = PostRecord {
                post_id: PostId::new(),
                author_id: author,
                author_username: "author".to_owned(),
                title: input.title,
                body: input.body,
                created_at: Utc::now(),
            };
            self.posts.lock().await.push(post.clone());
            Ok(post)
        }

        async fn update_post(
            &self,
            post_id: PostId,
            input: UpdatePostInput,
        ) -> AppResult<PostRecord> {
            let mut posts = self.posts.lock().await;
            let post = posts
                .iter_mut()
                .find(|post| post.post_id == post_id)
                .ok_or_else(|| AppError::NotFound("post not found".to_owned()))?;
            if let Some(title) = input.title {
                post.title = title;
            }
            if let Some(body) = input.body {
                post.body = body;
            }
            Ok(post.clone())
        }

        async fn delete_post(&self, post_id: PostId) -> AppResult<()> {
            self.posts.lock().await.retain(|post| post.post_id != post_id);
            self.comments
                .lock()
                .await
                .retain(|comment| comment.post_id != post_id);
            Ok(())
        }

        async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentRecord>> {
            Ok(self
                .comments
                .lock()
                .await
                .iter()
                .filter(|comment| comment.post_id == post_id)
                .cloned()
                .collect())
        }

        async fn find_comment(&self, comment_id: CommentId) -> AppResult<Option<CommentRecord>> {
            Ok(self
                .comments
                .lock()
                .await
                .iter()
                .find(|comment| comment.comment_id == comment_id)
                .cloned())
        }

        async fn insert_comment(
            &self,
            post_id: PostId,
            author: UserId,
            body: String,
        ) -> AppResult<CommentRecord> {
            let comment = CommentRecord {
                comment_id: CommentId::new(),
                post_id,
                author_id: author,
                author_username: "author".to_owned(),
                body,
                created_at: Utc::now(),
            };
            self.comments.lock().await.push(comment.clone());
            Ok(comment)
        }

        async fn delete_comment(&self, comment_id: CommentId) -> AppResult<()> {
            self.comments
                .lock()
                .await
                .retain(|comment| comment.comment_id != comment_id);
            Ok(())
        }
    }

    fn actor(role: RoleName, names: &[&str]) -> Principal {
        let grants = names
            .iter()
            .map(|name| PermissionGrant {
                name: (*name).to_owned(),
                resource: String::new(),
                action: String::new(),
                description: None,
            })
            .collect();
        Principal::new(
            UserId::new(),
            "poster",
            "poster@example.com",
            role,
            PermissionSet::new(grants),
        )
    }

    fn service() -> ContentService {
        ContentService::new(Arc::new(FakeContentRepository::default()))
    }

    #[tokio::test]
    async fn posts_are_publicly_readable() {
        let service = service();

        let result = service.list_posts().await;

        assert!(matches!(result, Ok(posts) if posts.is_empty()));
    }

    #[tokio::test]
    async fn create_post_requires_permission() {
        let service = service();
        let denied = service
            .create_post(
                &actor(RoleName::User, &[]),
                CreatePostInput {
                    title: "Depot closure".to_owned(),
                    body: "North depot closed on Friday.".to_owned(),
                },
            )
            .await;

        assert!(matches!(denied, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let service = service();
        let commenter = actor(RoleName::User, &[permissions::COMMENTS_CREATE]);

        let result = service
            .create_comment(&commenter, PostId::new(), "first".to_owned())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn author_or_privileged_may_delete_comment() {
        let service = service();
        let author = actor(
            RoleName::User,
            &[
                permissions::POSTS_CREATE,
                permissions::COMMENTS_CREATE,
                permissions::COMMENTS_DELETE,
            ],
        );
        let Ok(post) = service
            .create_post(
                &author,
                CreatePostInput {
                    title: "Depot closure".to_owned(),
                    body: "North depot closed on Friday.".to_owned(),
                },
            )
            .await
        else {
            panic!("post creation failed");
        };
        let Ok(comment) = service
            .create_comment(&author, post.post_id, "noted".to_owned())
            .await
        else {
            panic!("comment creation failed");
        };

        let stranger = actor(RoleName::User, &[permissions::COMMENTS_DELETE]);
        let denied = service.delete_comment(&stranger, comment.comment_id).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let admin = actor(RoleName::Admin, &[permissions::COMMENTS_DELETE]);
        let allowed = service.delete_comment(&admin, comment.comment_id).await;
        assert!(allowed.is_ok());
    }

    #[tokio::test]
    async fn update_post_rejects_blank_title() {
        let service = service();
        let author = actor(
            RoleName::User,
            &[permissions::POSTS_CREATE, permissions::POSTS_UPDATE],
        );
        let Ok(post) = service
            .create_post(
                &author,
                CreatePostInput {
                    title: "Depot closure".to_owned(),
                    body: "North depot closed on Friday.".to_owned(),
                },
            )
            .await
        else {
            panic!("post creation failed");
        };

        let result = service
            .update_post(
                &author,
                post.post_id,
                UpdatePostInput {
                    title: Some("   ".to_owned()),
                    body: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
