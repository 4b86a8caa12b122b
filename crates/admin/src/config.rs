//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the back-office
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `MEDIA_DIR` - Where uploaded images are written (default: `media`)
//! - `MEDIA_BASE_URL` - Public URL prefix for uploads (default: `{ADMIN_BASE_URL}/media`)
//! - `MEDIA_MAX_UPLOAD_BYTES` - Largest accepted upload (default: 10 MiB)
//! - `ORDER_NOTIFIER_ENABLED` - Listen for new orders and send their emails (default: true)
//! - `EMAIL_API_URL`, `EMAIL_API_KEY`, `EMAIL_FROM`, `ADMIN_NOTIFICATION_EMAIL` - as for the storefront
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for structured logs

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;

pub use marigold_storefront::config::{ConfigError, EmailConfig};
use marigold_storefront::config::{
    get_base_url, get_database_url, get_env_or_default, get_optional_env, get_parsed_or_default,
    get_validated_secret, validate_session_secret,
};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the back-office
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Uploaded media storage
    pub media: MediaConfig,
    /// Whether this process runs the order notification listener
    pub order_notifier_enabled: bool,
    /// Transactional email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
}

/// Local object storage for product and blog images.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploads are written to and served from
    pub dir: PathBuf,
    /// Public URL prefix, without trailing slash
    pub base_url: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_parsed_or_default("ADMIN_PORT", 3001_u16)?;
        let base_url = get_base_url("ADMIN_BASE_URL")?;
        let session_secret = get_validated_secret("ADMIN_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "ADMIN_SESSION_SECRET")?;

        let media = MediaConfig::from_env(&base_url)?;
        let order_notifier_enabled = get_parsed_or_default("ORDER_NOTIFIER_ENABLED", true)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            media,
            order_notifier_enabled,
            email: EmailConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MediaConfig {
    fn from_env(admin_base_url: &str) -> Result<Self, ConfigError> {
        let dir = PathBuf::from(get_env_or_default("MEDIA_DIR", "media"));
        let base_url = match get_optional_env("MEDIA_BASE_URL") {
            Some(url) => {
                url::Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar("MEDIA_BASE_URL".to_string(), e.to_string())
                })?;
                url.trim_end_matches('/').to_string()
            }
            None => format!("{admin_base_url}/media"),
        };
        let max_upload_bytes = get_parsed_or_default("MEDIA_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            dir,
            base_url,
            max_upload_bytes,
        })
    }

    /// Public URL of a stored file.
    #[must_use]
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.base_url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn media() -> MediaConfig {
        MediaConfig {
            dir: PathBuf::from("media"),
            base_url: "https://admin.marigold.shop/media".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    #[test]
    fn test_media_url_for() {
        assert_eq!(
            media().url_for("a1b2.png"),
            "https://admin.marigold.shop/media/a1b2.png"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/marigold"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("k3J9x!2mQ7#pL8vR4@tY6wZ1&nB5cD0e"),
            media: media(),
            order_notifier_enabled: false,
            email: EmailConfig::mock(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
    }
}
