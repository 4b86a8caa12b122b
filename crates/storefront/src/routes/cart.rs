//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every handler loads it, applies
//! one [`CartAction`] and writes it back, so the stored total is always the
//! reducer's.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use marigold_core::cart::{Cart, CartAction, CartItem, CartKey};
use marigold_core::catalog::ensure_quantity_allowed;
use marigold_core::{Money, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::session::{load_or_default, save};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Money,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

/// Add-to-cart body.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// Quantity update body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: u32,
}

/// Load the session cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(load_or_default(session, session_keys::CART).await?)
}

async fn apply(session: &Session, action: CartAction) -> Result<Json<CartView>> {
    let mut cart = load_cart(session).await?;
    cart.apply(action);
    save(session, session_keys::CART, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product variant, snapshotting its current price.
///
/// Quantities below one are raised to one. Stock and the per-line cap are
/// checked against the quantity the row will hold after the merge.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let quantity = body.quantity.unwrap_or(1).max(1);
    ensure_quantity_allowed(quantity)?;
    let product = state
        .catalog()
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let color = body.color.as_deref();
    let size = body.size.as_deref();
    let price = product.unit_price(color, size)?;

    let mut cart = load_cart(&session).await?;
    let key = CartKey {
        product_id: product.id,
        color: body.color.clone(),
        size: body.size.clone(),
    };
    let in_cart = cart
        .items()
        .iter()
        .find(|item| item.key() == key)
        .map_or(0, |item| item.quantity);
    product.ensure_in_stock(color, size, in_cart.saturating_add(quantity))?;

    cart.apply(CartAction::Add(CartItem {
        product_id: product.id,
        title: product.title.clone(),
        price,
        image: product.primary_image().map(str::to_owned),
        quantity,
        color: body.color,
        size: body.size,
    }));
    save(&session, session_keys::CART, &cart).await?;

    tracing::debug!(product_id = %product.id, quantity, "Added to cart");
    Ok(Json(CartView::from(&cart)))
}

/// Set the quantity of every row for a product, clamped to at least one.
///
/// Each row's variation must have the new quantity in stock.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let quantity = body.quantity.max(1);
    ensure_quantity_allowed(quantity)?;

    let mut cart = load_cart(&session).await?;
    if cart.rows_for(product_id).next().is_some() {
        let product = state
            .catalog()
            .get(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
        for row in cart.rows_for(product_id) {
            product.ensure_in_stock(row.color.as_deref(), row.size.as_deref(), quantity)?;
        }
    }

    cart.apply(CartAction::UpdateQuantity {
        product_id,
        quantity,
    });
    save(&session, session_keys::CART, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove every row for a product.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(product_id): Path<ProductId>) -> Result<Json<CartView>> {
    apply(&session, CartAction::Remove { product_id }).await
}

/// Remove a single variant row.
#[instrument(skip(session))]
pub async fn remove_variant(session: Session, Json(key): Json<CartKey>) -> Result<Json<CartView>> {
    apply(&session, CartAction::RemoveVariant(key)).await
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    apply(&session, CartAction::Clear).await
}
