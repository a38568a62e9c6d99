//! Rental service HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules, the shared error helpers, and the OpenAPI
//! document.
pub mod error;
pub mod movies;
pub mod openapi;
pub mod rentals;
pub mod system;
pub mod types;
