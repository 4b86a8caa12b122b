//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::catalog::CatalogService;
use crate::services::email::{EmailError, EmailService};
use crate::services::payment::PaymentService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogService,
    email: EmailService,
    payments: PaymentService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the email HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, EmailError> {
        let email = EmailService::new(&config.email)?;
        Ok(Self::with_email(config, pool, email))
    }

    /// Create state around an existing email service.
    #[must_use]
    pub fn with_email(config: StorefrontConfig, pool: PgPool, email: EmailService) -> Self {
        let catalog = CatalogService::new(pool.clone(), config.catalog_cache_ttl);
        let payments = PaymentService::new(config.card_demo_delay);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                email,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cached catalog reads.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Transactional email.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Demo payment processor.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }
}
