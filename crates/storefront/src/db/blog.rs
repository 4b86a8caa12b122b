//! Blog posts and their comments.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use marigold_core::content::{BlogPost, Comment};
use marigold_core::{CommentId, PostId, UserId};

use super::RepositoryError;

/// Columns selected for a [`BlogPostRow`].
pub const POST_COLUMNS: &str = "id, slug, title, excerpt, body, cover_image, tags, author, \
     published, published_at, created_at, updated_at";

/// A `shop.blog_posts` row.
#[derive(Debug, sqlx::FromRow)]
pub struct BlogPostRow {
    pub id: PostId,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub author: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPostRow> for BlogPost {
    fn from(r: BlogPostRow) -> Self {
        Self {
            id: r.id,
            slug: r.slug,
            title: r.title,
            excerpt: r.excerpt,
            body: r.body,
            cover_image: r.cover_image,
            tags: r.tags,
            author: r.author,
            published: r.published,
            published_at: r.published_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    post_id: PostId,
    user_id: UserId,
    author_name: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(r: CommentRow) -> Self {
        Self {
            id: r.id,
            post_id: r.post_id,
            user_id: r.user_id,
            author_name: r.author_name,
            body: r.body,
            created_at: r.created_at,
        }
    }
}

/// Public read access to the blog, plus posting comments.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first, optionally restricted to a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        tag: Option<&str>,
        limit: u32,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_posts WHERE published"
        ));
        if let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty()) {
            qb.push(" AND ")
                .push_bind(tag.to_lowercase())
                .push(" = ANY(tags)");
        }
        qb.push(" ORDER BY published_at DESC NULLS LAST, id DESC LIMIT ")
            .push_bind(i64::from(limit));

        let rows: Vec<BlogPostRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    /// A published post by slug. Drafts are invisible here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let row: Option<BlogPostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_posts WHERE slug = $1 AND published"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(BlogPost::from))
    }

    /// Comments on a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            r"
            SELECT c.id, c.post_id, c.user_id, u.display_name AS author_name, c.body, c.created_at
            FROM shop.comments c
            JOIN shop.users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(post_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// Add a comment and return it with the author's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        body: &str,
    ) -> Result<Comment, RepositoryError> {
        let row: CommentRow = sqlx::query_as(
            r"
            WITH inserted AS (
                INSERT INTO shop.comments (post_id, user_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, user_id, body, created_at
            )
            SELECT i.id, i.post_id, i.user_id, u.display_name AS author_name, i.body, i.created_at
            FROM inserted i
            JOIN shop.users u ON u.id = i.user_id
            ",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(body.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
