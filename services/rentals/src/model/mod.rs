//! Rental service data model module.
//!
//! # Purpose
//! Re-exports the catalog item and rental record models shared by the API and
//! store layers.
mod movie;
mod rental;

pub use movie::{Movie, MoviePatch, NewMovie};
pub use rental::{NewRental, Rental};
