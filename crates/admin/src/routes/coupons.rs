//! Coupon management.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use marigold_core::CouponId;
use marigold_core::coupon::{Coupon, CouponInput};

use crate::db::CouponRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Build the coupons router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
}

/// GET /api/coupons
async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Coupon>>> {
    Ok(Json(CouponRepository::new(state.pool()).list().await?))
}

/// GET /api/coupons/{id}
async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Json<Coupon>> {
    Ok(Json(CouponRepository::new(state.pool()).get(id).await?))
}

/// POST /api/coupons
#[instrument(skip(admin, state, input), fields(admin_id = %admin.id, code = %input.code))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CouponInput>,
) -> Result<(StatusCode, Json<Coupon>)> {
    input.validate()?;
    let coupon = CouponRepository::new(state.pool()).create(&input).await?;
    tracing::info!(coupon_id = %coupon.id, "Coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// PUT /api/coupons/{id}
#[instrument(skip(admin, state, input), fields(admin_id = %admin.id, code = %input.code))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
    Json(input): Json<CouponInput>,
) -> Result<Json<Coupon>> {
    input.validate()?;
    let coupon = CouponRepository::new(state.pool()).update(id, &input).await?;
    tracing::info!("Coupon updated");
    Ok(Json(coupon))
}

/// DELETE /api/coupons/{id}
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<StatusCode> {
    CouponRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Coupon deleted");
    Ok(StatusCode::NO_CONTENT)
}
