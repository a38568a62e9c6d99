//! Persistence layer for the movie catalog and rental records.
//!
//! # Purpose
//! Defines the [`RentalStore`] trait used by HTTP handlers and the error type
//! shared by its backends.
//!
//! # Notes
//! - [`memory::InMemoryStore`] backs local development and tests.
//! - [`postgres::PostgresStore`] is the durable backend; cascades and unique
//!   names are enforced by the schema.
use crate::model::{Movie, MoviePatch, NewMovie, NewRental, Rental};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".into()),
            other => StoreError::Unexpected(other.into()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RentalStore: Send + Sync {
    /// All movies ordered by id.
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;
    async fn get_movie(&self, id: i64) -> StoreResult<Movie>;
    /// Fails with [`StoreError::Conflict`] when the name is taken.
    async fn create_movie(&self, movie: NewMovie) -> StoreResult<Movie>;
    async fn patch_movie(&self, id: i64, patch: MoviePatch) -> StoreResult<Movie>;
    /// Removes the movie and every rental that references it.
    async fn delete_movie(&self, id: i64) -> StoreResult<()>;

    /// All rentals ordered by id, each joined with its movie.
    async fn list_rentals(&self) -> StoreResult<Vec<Rental>>;
    /// Fails with [`StoreError::NotFound`] when the movie does not exist.
    async fn create_rental(&self, rental: NewRental) -> StoreResult<Rental>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
