//! Marigold Core - Shared domain library.
//!
//! This crate provides the domain model used across all Marigold components:
//! - `storefront` - Public-facing shop API
//! - `admin` - Back-office API and order notifications
//! - `cli` - Command-line tools for migrations, seeding and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Everything here can be unit tested without a
//! runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`catalog`] - Products and their color/size variations
//! - [`cart`] - The cart reducer
//! - [`coupon`] - Coupon validation and discount calculation
//! - [`order`] - Order assembly and submission validation
//! - [`checkout`] - The checkout wizard and its double-submit guard
//! - [`payment`] - Payment method selection and demo card validation
//! - [`analytics`] - Aggregations over fetched orders
//! - [`content`] - Blog posts, comments and product reviews

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod types;

pub use types::*;
