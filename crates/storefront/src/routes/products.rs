//! Catalog and review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marigold_core::ProductId;
use marigold_core::catalog::{Product, ProductQuery};
use marigold_core::content::{Review, average_rating, validate_body, validate_rating};

use crate::db::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Product detail with its reviews.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
    pub average_rating: Option<Decimal>,
}

/// Review submission body.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
}

/// List products with optional category, featured, search and sort filters.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list(&query).await?;
    Ok(Json(Vec::clone(&products)))
}

/// Product detail page data.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    let product = state
        .catalog()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(Json(ProductDetail {
        product: Product::clone(&product),
        average_rating: average_rating(&reviews),
        reviews,
    }))
}

/// Distinct categories for navigation.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = state.catalog().categories().await?;
    Ok(Json(Vec::clone(&categories)))
}

/// Leave a review. One per customer per product.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<ProductId>,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    validate_rating(form.rating)?;
    validate_body(&form.body)?;

    if state.catalog().get(id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let review = ReviewRepository::new(state.pool())
        .create(id, user.id, form.rating, form.title.as_deref(), &form.body)
        .await?;

    tracing::info!(review_id = %review.id, product_id = %id, "Review created");
    Ok((StatusCode::CREATED, Json(review)))
}
