//! Blog post writes and comment moderation.

use sqlx::PgPool;

use marigold_core::content::{BlogPost, BlogPostInput};
use marigold_core::{CommentId, PostId};
use marigold_storefront::db::RepositoryError;
use marigold_storefront::db::blog::{BlogPostRow, POST_COLUMNS};

/// Blog administration. Sees drafts as well as published posts.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every post, drafts included, most recently edited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let rows: Vec<BlogPostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_posts ORDER BY updated_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    /// Get one post by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no post has this id.
    pub async fn get(&self, id: PostId) -> Result<BlogPost, RepositoryError> {
        let row: Option<BlogPostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(BlogPost::from).ok_or(RepositoryError::NotFound)
    }

    /// Insert a post from normalized input.
    ///
    /// `published_at` is stamped when the post is created published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &BlogPostInput) -> Result<BlogPost, RepositoryError> {
        let row: BlogPostRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shop.blog_posts
                (slug, title, excerpt, body, cover_image, tags, author, published, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $8 THEN NOW() END)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(input.slug.as_deref().unwrap_or_default())
        .bind(input.title.trim())
        .bind(input.excerpt.as_deref())
        .bind(&input.body)
        .bind(input.cover_image.as_deref())
        .bind(&input.tags)
        .bind(input.author.trim())
        .bind(input.published)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a post with this slug"))?;

        Ok(row.into())
    }

    /// Replace a post from normalized input.
    ///
    /// The first publish stamps `published_at`; unpublishing keeps it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(&self, id: PostId, input: &BlogPostInput) -> Result<BlogPost, RepositoryError> {
        let row: Option<BlogPostRow> = sqlx::query_as(&format!(
            r"
            UPDATE shop.blog_posts
            SET slug = $2, title = $3, excerpt = $4, body = $5, cover_image = $6, tags = $7,
                author = $8, published = $9,
                published_at = CASE WHEN $9 AND published_at IS NULL THEN NOW() ELSE published_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.slug.as_deref().unwrap_or_default())
        .bind(input.title.trim())
        .bind(input.excerpt.as_deref())
        .bind(&input.body)
        .bind(input.cover_image.as_deref())
        .bind(&input.tags)
        .bind(input.author.trim())
        .bind(input.published)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a post with this slug"))?;

        row.map(BlogPost::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a post and its comments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no post has this id.
    pub async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.blog_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no comment has this id.
    pub async fn delete_comment(&self, id: CommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
