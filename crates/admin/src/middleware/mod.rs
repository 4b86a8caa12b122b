//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (shared with the storefront)
//! 4. Session layer (`SameSite=Strict`, 24h)
//! 5. Security headers (shared with the storefront)
//! 6. [`RequireAdmin`] on every handler except sign-in

pub mod auth;
pub mod session;

pub use auth::RequireAdmin;
pub use session::{admin_session_layer, create_session_layer};
