//! Marigold back-office library.
//!
//! Product, blog, coupon and order management, settings, analytics and
//! image uploads over a JSON API, plus the listener that emails customers
//! about new orders. Shares the storefront's schema, accounts and email
//! service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
