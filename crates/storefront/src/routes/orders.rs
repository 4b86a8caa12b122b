//! Order tracking route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tower_sessions::Session;
use tracing::instrument;

use marigold_core::OrderId;
use marigold_core::checkout::Checkout;
use marigold_core::order::Order;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::session::load_or_default;
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::session_keys;
use crate::state::AppState;

/// The signed-in customer's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// One order.
///
/// Visible to its owner, and to the session that just placed it so guests
/// can see their confirmation. Everyone else gets a 404.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let not_found = || AppError::NotFound(format!("order {id}"));

    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(not_found)?;

    let owned = matches!((&user, order.user_id), (Some(u), Some(owner)) if u.id == owner);
    let placed_here = if owned {
        false
    } else {
        let checkout: Checkout = load_or_default(&session, session_keys::CHECKOUT).await?;
        checkout.order_id() == Some(id)
    };

    if owned || placed_here {
        Ok(Json(order))
    } else {
        Err(not_found())
    }
}
