//! Blog route handlers.
//!
//! Post bodies are markdown, rendered to HTML on read.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marigold_core::content::{BlogPost, Comment, validate_body};

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::markdown::{reading_time_minutes, render_markdown};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Listing filters.
#[derive(Debug, Deserialize)]
pub struct BlogQuery {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Post card for listings; no body.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
}

impl From<BlogPost> for PostSummary {
    fn from(post: BlogPost) -> Self {
        Self {
            reading_time_minutes: reading_time_minutes(&post.body),
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            tags: post.tags,
            author: post.author,
            published_at: post.published_at,
        }
    }
}

/// A full post with rendered HTML and its comments.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: BlogPost,
    pub html: String,
    pub reading_time_minutes: u32,
    pub comments: Vec<Comment>,
}

/// Comment body.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub body: String,
}

/// Published posts, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BlogQuery>,
) -> Result<Json<Vec<PostSummary>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let posts = BlogRepository::new(state.pool())
        .list_published(query.tag.as_deref(), limit)
        .await?;
    Ok(Json(posts.into_iter().map(PostSummary::from).collect()))
}

/// One published post.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostView>> {
    let repo = BlogRepository::new(state.pool());
    let post = repo
        .get_published(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;
    let comments = repo.comments(post.id).await?;

    Ok(Json(PostView {
        html: render_markdown(&post.body),
        reading_time_minutes: reading_time_minutes(&post.body),
        comments,
        post,
    }))
}

/// Comment on a published post.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
    Json(form): Json<CommentForm>,
) -> Result<(StatusCode, Json<Comment>)> {
    validate_body(&form.body)?;

    let repo = BlogRepository::new(state.pool());
    let post = repo
        .get_published(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;
    let comment = repo.add_comment(post.id, user.id, &form.body).await?;

    tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");
    Ok((StatusCode::CREATED, Json(comment)))
}
