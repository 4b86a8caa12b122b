//! Blog post management and comment moderation.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use tracing::instrument;

use marigold_core::content::{BlogPost, BlogPostInput};
use marigold_core::{CommentId, PostId};

use crate::db::BlogRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Build the blog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
}

/// Build the comment moderation router.
pub fn comment_router() -> Router<AppState> {
    Router::new().route("/{id}", delete(destroy_comment))
}

/// GET /api/blog
async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(BlogRepository::new(state.pool()).list_all().await?))
}

/// GET /api/blog/{id}
async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<Json<BlogPost>> {
    Ok(Json(BlogRepository::new(state.pool()).get(id).await?))
}

/// POST /api/blog
#[instrument(skip(admin, state, input), fields(admin_id = %admin.id))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BlogPostInput>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let input = input.normalized()?;
    let post = BlogRepository::new(state.pool()).create(&input).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/blog/{id}
#[instrument(skip(admin, state, input), fields(admin_id = %admin.id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Json(input): Json<BlogPostInput>,
) -> Result<Json<BlogPost>> {
    let input = input.normalized()?;
    let post = BlogRepository::new(state.pool()).update(id, &input).await?;
    tracing::info!(published = post.published, "Post updated");
    Ok(Json(post))
}

/// DELETE /api/blog/{id}
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<StatusCode> {
    BlogRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/comments/{id}
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy_comment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
) -> Result<StatusCode> {
    BlogRepository::new(state.pool()).delete_comment(id).await?;
    tracing::info!("Comment removed");
    Ok(StatusCode::NO_CONTENT)
}
