//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the JSON envelopes of the rental API and the schemas published in
//! the OpenAPI document.
use crate::model::{Movie, Rental};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct StoreHealth {
    pub status: String,
    pub backend: String,
    pub durable: bool,
}

/// Generic error body. `error` repeats the HTTP status code.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieListResponse {
    pub success: bool,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieResponse {
    pub success: bool,
    pub movie: Movie,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieDeletedResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RentalListResponse {
    pub success: bool,
    pub movies: Vec<Rental>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RentalResponse {
    pub success: bool,
    pub rented_movie: Rental,
}

/// Body of `POST /create-movie`. Both fields are required; they are optional
/// here so a missing field can be reported as 422 rather than a decode error.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct CreateMovieRequest {
    pub movie_name: Option<String>,
    pub price: Option<i64>,
}

/// A movie id sent either as a JSON number or as a numeric string.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MovieIdInput {
    Number(i64),
    Text(String),
}

impl MovieIdInput {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            MovieIdInput::Number(id) => Some(*id),
            MovieIdInput::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct RentMovieRequest {
    pub movie_id: Option<MovieIdInput>,
    pub days: Option<i64>,
}
