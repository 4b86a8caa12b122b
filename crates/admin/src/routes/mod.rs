//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! POST   /api/auth/login               - Sign in (admins only)
//! POST   /api/auth/logout              - Sign out
//! GET    /api/auth/me                  - Signed-in admin
//!
//! GET    /api/products                 - All products
//! POST   /api/products                 - Create
//! GET    /api/products/{id}            - Detail
//! PUT    /api/products/{id}            - Replace
//! DELETE /api/products/{id}            - Delete
//!
//! GET    /api/blog                     - All posts, drafts included
//! POST   /api/blog                     - Create
//! GET    /api/blog/{id}                - Detail
//! PUT    /api/blog/{id}                - Replace
//! DELETE /api/blog/{id}                - Delete
//! DELETE /api/comments/{id}            - Remove a comment
//!
//! GET    /api/coupons                  - All coupons
//! POST   /api/coupons                  - Create
//! GET    /api/coupons/{id}             - Detail
//! PUT    /api/coupons/{id}             - Replace
//! DELETE /api/coupons/{id}             - Delete
//!
//! GET    /api/orders                   - Orders (status, limit)
//! GET    /api/orders/{id}              - Detail
//! PUT    /api/orders/{id}/status       - Set status
//!
//! GET    /api/settings                 - All settings
//! GET    /api/settings/{key}           - One setting
//! PUT    /api/settings/{key}           - Set one setting
//!
//! GET    /api/analytics                - Sales summary (top, from, to)
//! POST   /api/media                    - Upload an image (multipart `file`)
//! ```
//!
//! Everything except sign-in requires [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod analytics;
pub mod auth;
pub mod blog;
pub mod coupons;
pub mod media;
pub mod orders;
pub mod products;
pub mod settings;

use axum::Router;

use marigold_storefront::middleware::auth_rate_limiter;

use crate::state::AppState;

fn build(max_upload_bytes: usize, limited: bool) -> Router<AppState> {
    let mut auth = auth::router();
    if limited {
        auth = auth.layer(auth_rate_limiter());
    }

    Router::new().nest(
        "/api",
        Router::new()
            .nest("/auth", auth)
            .nest("/products", products::router())
            .nest("/blog", blog::router())
            .nest("/comments", blog::comment_router())
            .nest("/coupons", coupons::router())
            .nest("/orders", orders::router())
            .nest("/settings", settings::router())
            .nest("/analytics", analytics::router())
            .nest("/media", media::router(max_upload_bytes)),
    )
}

/// All admin API routes, without rate limiting.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    build(max_upload_bytes, false)
}

/// All admin API routes with a per-IP limit on sign-in.
///
/// Requests must carry a client address: a forwarding header or
/// `ConnectInfo<SocketAddr>`.
pub fn routes_with_rate_limits(max_upload_bytes: usize) -> Router<AppState> {
    build(max_upload_bytes, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use marigold_storefront::config::EmailConfig;
    use marigold_storefront::services::email::EmailService;

    use super::*;
    use crate::config::{AdminConfig, MediaConfig};
    use crate::middleware::admin_session_layer;

    fn test_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/marigold_test"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3001,
            base_url: "http://localhost:3001".to_owned(),
            session_secret: SecretString::from("k3J9x!2mQ7#pL8vR4@tY6wZ1&nB5cD0e"),
            media: MediaConfig {
                dir: PathBuf::from("media"),
                base_url: "http://localhost:3001/media".to_owned(),
                max_upload_bytes: 1024,
            },
            order_notifier_enabled: false,
            email: EmailConfig::mock(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Router over a lazy pool that never connects; every request here is
    /// rejected before touching the database.
    fn test_app() -> Router {
        let config = test_config();
        let max_upload = config.media.max_upload_bytes;
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/marigold_test")
            .unwrap();
        let state = AppState::with_email(config, pool, EmailService::mock(None));

        routes(max_upload)
            .layer(admin_session_layer(MemoryStore::default(), false))
            .with_state(state)
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_every_surface_requires_sign_in() {
        for (method, uri) in [
            ("GET", "/api/auth/me"),
            ("GET", "/api/products"),
            ("DELETE", "/api/products/1"),
            ("GET", "/api/blog"),
            ("DELETE", "/api/comments/3"),
            ("GET", "/api/coupons"),
            ("GET", "/api/orders?status=shipped"),
            ("GET", "/api/settings"),
            ("GET", "/api/analytics"),
        ] {
            assert_eq!(
                status_of(method, uri).await,
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_logout_without_session_succeeds() {
        assert_eq!(status_of("POST", "/api/auth/logout").await, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let request = Request::builder()
            .uri("/api/orders")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Unauthorized: sign in required");
    }
}
