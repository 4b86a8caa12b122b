//! Image uploads.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::media::StoredMedia;
use crate::state::AppState;

/// Multipart framing allowance on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the upload router. The body limit follows the configured
/// maximum upload size.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD)))
}

/// POST /api/media (multipart, field `file`)
#[instrument(skip(admin, state, multipart), fields(admin_id = %admin.id))]
async fn upload(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StoredMedia>)> {
    let stored = state.media().store_multipart(multipart).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
