//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use marigold_storefront::services::email::{EmailError, EmailService};

use crate::config::AdminConfig;
use crate::services::media::MediaStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    email: EmailService,
    media: MediaStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the email HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, EmailError> {
        let email = EmailService::new(&config.email)?;
        Ok(Self::with_email(config, pool, email))
    }

    /// Create state around an existing email service.
    #[must_use]
    pub fn with_email(config: AdminConfig, pool: PgPool, email: EmailService) -> Self {
        let media = MediaStore::new(config.media.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                media,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Transactional email, shared with the order notifier.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Upload storage.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }
}
