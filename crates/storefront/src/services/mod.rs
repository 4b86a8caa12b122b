//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email/password accounts with argon2 hashes
//! - `catalog` - Product reads through a TTL cache
//! - `checkout` - Coupon quoting and order placement
//! - `email` - Transactional email over HTTP, or mock mode
//! - `markdown` - Blog post rendering
//! - `notifications` - Claim-then-send order emails, shared with the admin listener
//! - `payment` - Demo card and hosted checkout processing

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod markdown;
pub mod notifications;
pub mod payment;
