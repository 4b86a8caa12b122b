//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/products                   - Product listing (category, featured, search, sort, limit)
//! GET    /api/products/{id}              - Product detail with reviews
//! POST   /api/products/{id}/reviews      - Leave a review (requires auth)
//! GET    /api/categories                 - Category list
//!
//! # Cart (session)
//! GET    /api/cart                       - Cart contents and total
//! DELETE /api/cart                       - Empty the cart
//! POST   /api/cart/items                 - Add a product variant
//! PATCH  /api/cart/items/{product_id}    - Set quantity for every variant of a product
//! DELETE /api/cart/items/{product_id}    - Remove every variant of a product
//! POST   /api/cart/items/remove          - Remove one variant row
//!
//! # Checkout (session)
//! GET    /api/checkout                   - Wizard state
//! POST   /api/checkout/start             - Cart → Shipping
//! POST   /api/checkout/shipping          - Shipping → Payment
//! POST   /api/checkout/back              - Step back
//! PUT    /api/checkout/coupon            - Apply or remove a coupon
//! GET    /api/checkout/quote             - Subtotal, discount and total
//! POST   /api/checkout/pay/card          - Demo card payment
//! POST   /api/checkout/pay/hosted        - Hosted checkout: create
//! POST   /api/checkout/pay/hosted/approve - Hosted checkout: approve
//! POST   /api/checkout/pay/cod           - Cash on delivery
//!
//! # Orders
//! GET    /api/orders                     - My orders (requires auth)
//! GET    /api/orders/{id}                - Order detail (owner or placing session)
//!
//! # Blog
//! GET    /api/blog                       - Published posts (tag, limit)
//! GET    /api/blog/{slug}                - Post with rendered body and comments
//! POST   /api/blog/{slug}/comments       - Comment (requires auth)
//!
//! # Auth
//! POST   /api/auth/register              - Sign up
//! POST   /api/auth/login                 - Sign in
//! POST   /api/auth/logout                - Sign out
//! GET    /api/auth/me                    - Current user or null
//! ```

pub mod auth;
pub mod blog;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", post(products::create_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/remove", post(cart::remove_variant))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Wizard steps that never move money.
fn checkout_step_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/start", post(checkout::start))
        .route("/shipping", post(checkout::shipping))
        .route("/back", post(checkout::back))
        .route("/coupon", put(checkout::coupon))
        .route("/quote", get(checkout::quote))
}

/// Payment submission routes.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/card", post(checkout::pay_card))
        .route("/hosted", post(checkout::hosted_create))
        .route("/hosted/approve", post(checkout::hosted_approve))
        .route("/cod", post(checkout::pay_cod))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/{slug}", get(blog::show))
        .route("/{slug}/comments", post(blog::create_comment))
}

fn build(limited: bool) -> Router<AppState> {
    let mut auth = auth_routes();
    let mut payments = payment_routes();
    let mut api = Router::new()
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_step_routes())
        .nest("/orders", order_routes())
        .nest("/blog", blog_routes());

    if limited {
        auth = auth.layer(auth_rate_limiter());
        payments = payments.layer(auth_rate_limiter());
        api = api.layer(api_rate_limiter());
    }

    Router::new().nest(
        "/api",
        api.nest("/auth", auth).nest("/checkout/pay", payments),
    )
}

/// All storefront routes, without rate limiting.
pub fn routes() -> Router<AppState> {
    build(false)
}

/// All storefront routes with per-IP rate limits on sign-in, sign-up and
/// payment submission, and a looser limit on the rest of the API.
///
/// Requests must carry a client address: a forwarding header or
/// `ConnectInfo<SocketAddr>` from `into_make_service_with_connect_info`.
pub fn routes_with_rate_limits() -> Router<AppState> {
    build(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use marigold_core::catalog::{Product, Variation};
    use marigold_core::{Money, ProductId};

    use super::*;
    use crate::config::{EmailConfig, StorefrontConfig};
    use crate::middleware::session_layer;
    use crate::services::email::EmailService;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/marigold_test"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            session_secret: SecretString::from("k3J9x!2mQ7#pL8vR4@tY6wZ1&nB5cD0e"),
            email: EmailConfig::mock(),
            card_demo_delay: Duration::ZERO,
            catalog_cache_ttl: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// State over a lazy pool that never connects.
    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/marigold_test")
            .unwrap();
        AppState::with_email(test_config(), pool, EmailService::mock(None))
    }

    /// Router with an in-memory session store.
    fn app_with(state: AppState) -> Router {
        routes()
            .layer(session_layer(MemoryStore::default(), "marigold_session", false))
            .with_state(state)
    }

    fn test_app() -> Router {
        app_with(test_state())
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body, _) = send_to(&test_app(), request).await;
        (status, body)
    }

    /// Send through a shared router, returning the session cookie if one was set.
    async fn send_to(
        app: &Router,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value, Option<String>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned);
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body, cookie)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, method: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_visitor_has_empty_cart() {
        let (status, body) = send(get("/api/cart")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], serde_json::json!([]));
        let total: rust_decimal::Decimal = body["total"].as_str().unwrap().parse().unwrap();
        assert!(total.is_zero());
        assert_eq!(body["item_count"], 0);
    }

    #[tokio::test]
    async fn test_update_on_empty_cart_is_noop() {
        let (status, body) = send(post_json(
            "/api/cart/items/7",
            "PATCH",
            &serde_json::json!({ "quantity": 0 }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item_count"], 0);
    }

    /// A tee whose only variation has two units on hand.
    fn scarce_tee() -> Product {
        let now = chrono::Utc::now();
        Product {
            id: ProductId::new(7),
            title: "Linen Tee".to_owned(),
            description: String::new(),
            price: Money::from_cents(2000),
            images: vec![],
            category: "shirts".to_owned(),
            variations: vec![Variation {
                color: Some("sand".to_owned()),
                size: Some("M".to_owned()),
                stock: Some(2),
                price_adjustment: Money::ZERO,
            }],
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_quantity_update_respects_stock() {
        let state = test_state();
        state.catalog().prime(scarce_tee()).await;
        let app = app_with(state);

        let (status, body, cookie) = send_to(
            &app,
            post_json(
                "/api/cart/items",
                "POST",
                &serde_json::json!({ "product_id": 7, "quantity": 1, "color": "sand", "size": "M" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let cookie = cookie.unwrap();

        let patch = |quantity: u32| {
            let mut request = post_json(
                "/api/cart/items/7",
                "PATCH",
                &serde_json::json!({ "quantity": quantity }),
            );
            request
                .headers_mut()
                .insert("cookie", cookie.parse().unwrap());
            request
        };

        let (status, body, _) = send_to(&app, patch(3)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "only 2 left in stock");

        let (status, _, _) = send_to(&app, patch(500)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body, _) = send_to(&app, patch(2)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item_count"], 2);
    }

    #[tokio::test]
    async fn test_oversized_quantities_are_unprocessable() {
        let (status, body) = send(post_json(
            "/api/cart/items",
            "POST",
            &serde_json::json!({ "product_id": 7, "quantity": 4_000_000_000_u32 }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "at most 99 of an item per order");

        let (status, _) = send(post_json(
            "/api/cart/items/7",
            "PATCH",
            &serde_json::json!({ "quantity": 100 }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_checkout_starts_at_cart_step() {
        let (status, body) = send(get("/api/checkout")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], "cart");
        assert_eq!(body["step_number"], 1);
        assert_eq!(body["form_submitted"], false);
    }

    #[tokio::test]
    async fn test_checkout_refuses_empty_cart() {
        let (status, body) = send(post_json("/api/checkout/start", "POST", &serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "your cart is empty");
    }

    #[tokio::test]
    async fn test_shipping_before_start_is_out_of_order() {
        let (status, _) = send(post_json(
            "/api/checkout/shipping",
            "POST",
            &serde_json::json!({ "name": "Robin Vale" }),
        ))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_cod_without_shipping_is_refused() {
        let (status, _) = send(post_json("/api/checkout/pay/cod", "POST", &serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_me_is_null_when_signed_out() {
        let (status, body) = send(get("/api/auth/me")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_my_orders_requires_sign_in() {
        let (status, body) = send(get("/api/orders")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized: sign in required");
    }

    #[tokio::test]
    async fn test_commenting_requires_sign_in() {
        let (status, _) = send(post_json(
            "/api/blog/hello/comments",
            "POST",
            &serde_json::json!({ "body": "Lovely" }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_without_session_succeeds() {
        let (status, _) = send(post_json("/api/auth/logout", "POST", &serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
