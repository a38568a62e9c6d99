//! Movie rental service library crate.
//!
//! # Purpose
//! Exposes the HTTP API, bearer-token authorization, configuration, and the
//! storage backends for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
