//! Cached catalog reads.
//!
//! Listings, single products and the category list are cached with `moka`
//! for `CATALOG_CACHE_TTL_SECS`. Admin writes are picked up when entries
//! expire.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use marigold_core::ProductId;
use marigold_core::catalog::{Product, ProductQuery};

use crate::db::{ProductRepository, RepositoryError};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products(ProductQuery),
    Product(ProductId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Arc<Product>),
    Categories(Arc<Vec<String>>),
}

/// Catalog reads backed by a TTL cache.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    /// Create a catalog service with the given cache TTL.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { pool, cache }
    }

    /// Products matching a query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(&self.pool).list(query).await?);
        self.cache
            .insert(key, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// One product, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Arc<Product>>, RepositoryError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let Some(product) = ProductRepository::new(&self.pool).get(id).await? else {
            return Ok(None);
        };
        let product = Arc::new(product);
        self.cache
            .insert(key, CacheValue::Product(Arc::clone(&product)))
            .await;
        Ok(Some(product))
    }

    /// Distinct categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<String>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&CacheKey::Categories).await {
            return Ok(categories);
        }

        let categories = Arc::new(ProductRepository::new(&self.pool).categories().await?);
        self.cache
            .insert(CacheKey::Categories, CacheValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    #[cfg(test)]
    pub(crate) async fn prime(&self, product: Product) {
        self.cache
            .insert(CacheKey::Product(product.id), CacheValue::Product(Arc::new(product)))
            .await;
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
