//! Rental record model.
//!
//! # Purpose
//! Defines rental records as returned by the API, each embedding the movie it
//! references. Charges are fixed when the rental is created.
use crate::model::Movie;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Rental {
    pub id: i64,
    pub movie_id: i64,
    pub charges: i64,
    pub movie: Movie,
}

/// Insert payload for a rental; `charges` is already computed by the caller.
#[derive(Debug, Clone, Copy)]
pub struct NewRental {
    pub movie_id: i64,
    pub charges: i64,
}
