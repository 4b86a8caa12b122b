//! Product catalog queries.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use marigold_core::catalog::{Product, ProductQuery, ProductSort, Variation};
use marigold_core::{Money, ProductId};

use super::RepositoryError;

/// Columns selected for a [`ProductRow`].
pub const PRODUCT_COLUMNS: &str =
    "id, title, description, price, images, category, variations, featured, created_at, updated_at";

/// A `shop.products` row.
#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub images: Json<Vec<String>>,
    pub category: String,
    pub variations: Json<Vec<Variation>>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            price: r.price,
            images: r.images.0,
            category: r.category,
            variations: r.variations.0,
            featured: r.featured,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Read access to the catalog.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the query's filters, sorted and limited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE TRUE"));

        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            qb.push(" AND category = ").push_bind(category.to_owned());
        }
        if let Some(featured) = query.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(term) = query.search_term() {
            qb.push(" AND title ILIKE ")
                .push_bind(format!("%{}%", escape_like(term)));
        }

        qb.push(match query.sort.unwrap_or_default() {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY price ASC, id ASC",
            ProductSort::PriceDesc => " ORDER BY price DESC, id ASC",
            ProductSort::Title => " ORDER BY title ASC, id ASC",
        });
        qb.push(" LIMIT ").push_bind(i64::from(query.effective_limit()));

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Distinct categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM shop.products ORDER BY category")
                .fetch_all(self.pool)
                .await?;
        Ok(categories)
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off_now"), "50\\% off\\_now");
        assert_eq!(escape_like("plain"), "plain");
    }
}
