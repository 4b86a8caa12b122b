//! Order list, detail and status updates.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use marigold_core::order::Order;
use marigold_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 100;

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<u32>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", get(show))
        .route("/{id}/status", put(update_status))
}

/// GET /api/orders?status=&limit=
async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list(query.status, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
async fn show(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderRepository::new(state.pool()).get(id).await?))
}

/// PUT /api/orders/{id}/status
///
/// Any status may be set from any other, including reopening a cancelled
/// order.
#[instrument(skip(admin, state, body), fields(admin_id = %admin.id, status = %body.status))]
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;
    tracing::info!("Order status updated");
    Ok(Json(order))
}
