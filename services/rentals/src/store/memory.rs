//! In-memory implementation of the rental store.
//!
//! # Purpose
//! Implements [`RentalStore`] with `BTreeMap`s guarded by a `tokio::sync::RwLock`.
//! It exists for local development and tests, and as the fallback when no
//! database is configured.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Movies and rentals live under one lock so a delete and its cascade are
//!   observed atomically, the same way a single SQL statement would be.
//! - Unique movie names and the rental foreign key are checked under the write
//!   lock to mirror the Postgres constraints.
use super::{RentalStore, StoreError, StoreResult};
use crate::model::{Movie, MoviePatch, NewMovie, NewRental, Rental};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_movie_id: i64,
    next_rental_id: i64,
    movies: BTreeMap<i64, Movie>,
    /// Rental rows as stored: `(movie_id, charges)` keyed by rental id.
    rents: BTreeMap<i64, (i64, i64)>,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.movies
            .values()
            .any(|movie| movie.movie_name == name && Some(movie.id) != except)
    }
}

/// In-memory rental store.
///
/// Ids start at 1 and are never reused, matching `BIGSERIAL` behavior.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RentalStore for InMemoryStore {
    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        Ok(self.tables.read().await.movies.values().cloned().collect())
    }

    async fn get_movie(&self, id: i64) -> StoreResult<Movie> {
        self.tables
            .read()
            .await
            .movies
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("movie {id}")))
    }

    async fn create_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&movie.movie_name, None) {
            return Err(StoreError::Conflict("movie name exists".into()));
        }
        tables.next_movie_id += 1;
        let created = Movie {
            id: tables.next_movie_id,
            movie_name: movie.movie_name,
            price: movie.price,
        };
        tables.movies.insert(created.id, created.clone());
        metrics::counter!("rentals_movie_changes_total", "op" => "created").increment(1);
        Ok(created)
    }

    async fn patch_movie(&self, id: i64, patch: MoviePatch) -> StoreResult<Movie> {
        let mut tables = self.tables.write().await;
        if !tables.movies.contains_key(&id) {
            return Err(StoreError::NotFound(format!("movie {id}")));
        }
        if let Some(name) = &patch.movie_name
            && tables.name_taken(name, Some(id))
        {
            return Err(StoreError::Conflict("movie name exists".into()));
        }
        let movie = tables
            .movies
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("movie {id}")))?;
        movie.apply(&patch);
        let updated = movie.clone();
        metrics::counter!("rentals_movie_changes_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn delete_movie(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.movies.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("movie {id}")));
        }
        // Cascade: drop every rental that referenced the movie.
        tables.rents.retain(|_, (movie_id, _)| *movie_id != id);
        metrics::counter!("rentals_movie_changes_total", "op" => "deleted").increment(1);
        Ok(())
    }

    async fn list_rentals(&self) -> StoreResult<Vec<Rental>> {
        let tables = self.tables.read().await;
        tables
            .rents
            .iter()
            .map(|(id, (movie_id, charges))| {
                let movie = tables.movies.get(movie_id).cloned().ok_or_else(|| {
                    StoreError::Unexpected(anyhow::anyhow!(
                        "rental {id} references missing movie {movie_id}"
                    ))
                })?;
                Ok(Rental {
                    id: *id,
                    movie_id: *movie_id,
                    charges: *charges,
                    movie,
                })
            })
            .collect()
    }

    async fn create_rental(&self, rental: NewRental) -> StoreResult<Rental> {
        let mut tables = self.tables.write().await;
        let movie = tables
            .movies
            .get(&rental.movie_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("movie {}", rental.movie_id)))?;
        tables.next_rental_id += 1;
        let id = tables.next_rental_id;
        tables.rents.insert(id, (rental.movie_id, rental.charges));
        metrics::counter!("rentals_rentals_created_total").increment(1);
        Ok(Rental {
            id,
            movie_id: rental.movie_id,
            charges: rental.charges,
            movie,
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
