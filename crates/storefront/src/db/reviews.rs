//! Product reviews.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marigold_core::content::Review;
use marigold_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    author_name: String,
    rating: i16,
    title: Option<String>,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(r: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(r.rating)
            .map_err(|_| RepositoryError::DataCorruption(format!("rating out of range: {}", r.rating)))?;
        Ok(Self {
            id: r.id,
            product_id: r.product_id,
            user_id: r.user_id,
            author_name: r.author_name,
            rating,
            title: r.title,
            body: r.body,
            created_at: r.created_at,
        })
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r"
            SELECT r.id, r.product_id, r.user_id, u.display_name AS author_name,
                   r.rating, r.title, r.body, r.created_at
            FROM shop.reviews r
            JOIN shop.users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// Record a review. One review per customer per product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the customer already reviewed it.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: u8,
        title: Option<&str>,
        body: &str,
    ) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(
            r"
            WITH inserted AS (
                INSERT INTO shop.reviews (product_id, user_id, rating, title, body)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, product_id, user_id, rating, title, body, created_at
            )
            SELECT i.id, i.product_id, i.user_id, u.display_name AS author_name,
                   i.rating, i.title, i.body, i.created_at
            FROM inserted i
            JOIN shop.users u ON u.id = i.user_id
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(i16::from(rating))
        .bind(title.map(str::trim).filter(|t| !t.is_empty()))
        .bind(body.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "review for this product"))?;

        Review::try_from(row)
    }
}
