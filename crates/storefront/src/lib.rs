//! Marigold Storefront library.
//!
//! This crate provides the public shop API as a library, allowing it to be
//! tested and reused. The admin binary depends on it for the shared schema,
//! repositories and email delivery.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
