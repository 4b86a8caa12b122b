//! Marigold Admin - back-office API.
//!
//! Serves the admin JSON API on port 3001, the uploaded media directory at
//! `/media`, and runs the `order_created` listener unless
//! `ORDER_NOTIFIER_ENABLED=false`.
//!
//! Migrations are not run on startup: `cargo run -p marigold-cli -- migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware::from_fn, routing::get};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use marigold_admin::config::AdminConfig;
use marigold_admin::services::OrderNotifier;
use marigold_admin::state::AppState;
use marigold_admin::{db, middleware, routes};
use marigold_storefront::middleware::{request_id_middleware, security_headers_middleware};
use marigold_storefront::telemetry::{self, SentrySettings};

/// Start the order listener unless disabled; it stops when `stop` flips to true.
fn spawn_notifier(state: &AppState, stop: &watch::Receiver<bool>) -> Option<JoinHandle<()>> {
    if !state.config().order_notifier_enabled {
        tracing::info!("Order notifier disabled");
        return None;
    }

    let notifier = OrderNotifier::new(state.pool().clone(), state.email().clone());
    let mut stop = stop.clone();
    Some(tokio::spawn(async move {
        let stopped = async move {
            let _ = stop.wait_for(|stop| *stop).await;
        };
        if let Err(e) = notifier.run(stopped).await {
            tracing::error!(error = %e, "Order notifier could not start");
        }
    }))
}

#[tokio::main]
async fn main() {
    let config = AdminConfig::from_env().expect("Failed to load configuration");

    let _sentry_guard = telemetry::init(
        SentrySettings {
            dsn: config.sentry_dsn.as_deref(),
            environment: config.sentry_environment.as_deref(),
            release: sentry::release_name!(),
        },
        "marigold_admin=info,marigold_storefront=info,tower_http=debug",
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let state = AppState::new(config.clone(), pool.clone()).expect("Failed to create application state");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let notifier = spawn_notifier(&state, &shutdown_rx);
    drop(shutdown_rx);

    let session_layer = middleware::create_session_layer(&pool, &config);

    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes_with_rate_limits(config.media.max_upload_bytes))
        .nest_service("/media", ServeDir::new(&config.media.dir))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(telemetry::make_span::<Body>)
                .on_response(telemetry::record_response::<Body>),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("admin listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(telemetry::shutdown_signal())
    .await
    .expect("Server error");

    let _ = shutdown_tx.send(true);
    if let Some(handle) = notifier {
        let _ = handle.await;
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    telemetry::database_readiness(state.pool()).await
}
