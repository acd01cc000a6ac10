use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use fleetdesk_application::{
    CommentRecord, ContentRepository, CreatePostInput, PostRecord, UpdatePostInput,
};
use fleetdesk_core::{AppError, AppResult};
use fleetdesk_domain::{CommentId, PostId, UserId};

/// PostgreSQL-backed repository for post and comment rows.
#[derive(Clone)]
pub struct PostgresContentRepository {
    pool: PgPool,
}

impl PostgresContentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: uuid::Uuid,
    author_id: uuid::Uuid,
    author_username: String,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            post_id: PostId::from_uuid(row.id),
            author_id: UserId::from_uuid(row.author_id),
            author_username: row.author_username,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: uuid::Uuid,
    post_id: uuid::Uuid,
    author_id: uuid::Uuid,
    author_username: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            comment_id: CommentId::from_uuid(row.id),
            post_id: PostId::from_uuid(row.post_id),
            author_id: UserId::from_uuid(row.author_id),
            author_username: row.author_username,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn list_posts(&self) -> AppResult<Vec<PostRecord>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                posts.id,
                posts.author_id,
                users.username AS author_username,
                posts.title,
                posts.body,
                posts.created_at
            FROM posts
            INNER JOIN users ON users.id = posts.author_id
            ORDER BY posts.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list posts: {error}")))?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_post(&self, post_id: PostId) -> AppResult<Option<PostRecord>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                posts.id,
                posts.author_id,
                users.username AS author_username,
                posts.title,
                posts.body,
                posts.created_at
            FROM posts
            INNER JOIN users ON users.id = posts.author_id
            WHERE posts.id = $1
            LIMIT 1
            "#,
        )
        .bind(post_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find post: {error}")))?;

        Ok(row.map(PostRecord::from))
    }

    async fn insert_post(&self, author: UserId, input: CreatePostInput) -> AppResult<PostRecord> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (author_id, title, body)
                VALUES ($1, $2, $3)
                RETURNING id, author_id, title, body, created_at
            )
            SELECT
                inserted.id,
                inserted.author_id,
                users.username AS author_username,
                inserted.title,
                inserted.body,
                inserted.created_at
            FROM inserted
            INNER JOIN users ON users.id = inserted.author_id
            "#,
        )
        .bind(author.as_uuid())
        .bind(input.title.as_str())
        .bind(input.body.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert post: {error}")))?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, post_id: PostId, input: UpdatePostInput) -> AppResult<PostRecord> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET title = COALESCE($2, title),
                    body = COALESCE($3, body)
                WHERE id = $1
                RETURNING id, author_id, title, body, created_at
            )
            SELECT
                updated.id,
                updated.author_id,
                users.username AS author_username,
                updated.title,
                updated.body,
                updated.created_at
            FROM updated
            INNER JOIN users ON users.id = updated.author_id
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(input.title.as_deref())
        .bind(input.body.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update post: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("post '{post_id}' was not found")))?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, post_id: PostId) -> AppResult<()> {
        // Comments are removed by the ON DELETE CASCADE foreign key.
        let rows_affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete post: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "post '{post_id}' was not found"
            )));
        }

        Ok(())
    }

    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentRecord>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT
                comments.id,
                comments.post_id,
                comments.author_id,
                users.username AS author_username,
                comments.body,
                comments.created_at
            FROM comments
            INNER JOIN users ON users.id = comments.author_id
            WHERE comments.post_id = $1
            ORDER BY comments.created_at ASC
            "#,
        )
        .bind(post_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list comments: {error}")))?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn find_comment(&self, comment_id: CommentId) -> AppResult<Option<CommentRecord>> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT
                comments.id,
                comments.post_id,
                comments.author_id,
                users.username AS author_username,
                comments.body,
                comments.created_at
            FROM comments
            INNER JOIN users ON users.id = comments.author_id
            WHERE comments.id = $1
            LIMIT 1
            "#,
        )
        .bind(comment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find comment: {error}")))?;

        Ok(row.map(CommentRecord::from))
    }

    async fn insert_comment(
        &self,
        post_id: PostId,
        author: UserId,
        body: String,
    ) -> AppResult<CommentRecord> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, body, created_at
            )
            SELECT
                inserted.id,
                inserted.post_id,
                inserted.author_id,
                users.username AS author_username,
                inserted.body,
                inserted.created_at
            FROM inserted
            INNER JOIN users ON users.id = inserted.author_id
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(author.as_uuid())
        .bind(body.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert comment: {error}")))?;

        Ok(CommentRecord::from(row))
    }

    async fn delete_comment(&self, comment_id: CommentId) -> AppResult<()> {
        let rows_affected = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete comment: {error}")))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "comment '{comment_id}' was not found"
            )));
        }

        Ok(())
    }
}
