//! Back-office writes against the `shop` schema.
//!
//! Row types, column lists and read-side repositories come from the
//! storefront's `db` module; this module adds the admin-only mutations.
//! Settings use the storefront's `SettingsRepository` directly.

pub mod blog;
pub mod coupons;
pub mod orders;
pub mod products;

pub use blog::BlogRepository;
pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use marigold_storefront::db::{RepositoryError, SettingsRepository, create_pool};
