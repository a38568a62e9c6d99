//! Catalog item (movie) model.
//!
//! # Purpose
//! Defines the movie record, its creation payload, and the partial update
//! applied by `PATCH /movie/{id}`.
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A rentable catalog item.
///
/// `movie_name` is unique across the catalog. `price` is charged per rental day.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    pub movie_name: String,
    pub price: i64,
}

impl Movie {
    /// Charge for renting this movie for `days` days.
    ///
    /// Returns `None` when the product does not fit in an `i64`.
    pub fn rental_charge(&self, days: i64) -> Option<i64> {
        self.price.checked_mul(days)
    }

    /// Apply the fields present in `patch`, leaving the others untouched.
    pub fn apply(&mut self, patch: &MoviePatch) {
        if let Some(name) = &patch.movie_name {
            self.movie_name = name.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NewMovie {
    pub movie_name: String,
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct MoviePatch {
    pub movie_name: Option<String>,
    pub price: Option<i64>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        self.movie_name.is_none() && self.price.is_none()
    }
}
