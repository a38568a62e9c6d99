//! Postgres-backed implementation of the rental store.
//!
//! # What this module is
//! Implements [`RentalStore`] on top of `sqlx` and a `PgPool`. The `movies` and
//! `rents` tables are the only state the service owns.
//!
//! # Key invariants
//! - `movies.movie_name` is `UNIQUE`; violations surface as [`StoreError::Conflict`].
//! - `rents.movie_id` references `movies(id)` with `ON DELETE CASCADE`, so deleting a
//!   movie removes its rentals in the same statement.
//! - Every operation is a single statement; there are no multi-statement transactions.
//!
//! # Security notes
//! - Database URLs may contain credentials; never log them.
//! - All SQL is static and parameterized.
//!
//! # Operational notes
//! Migrations are executed at startup via `sqlx::migrate!("./migrations")` so handlers
//! can assume the schema exists. Pool connect and acquire timeouts are bounded so a
//! database outage fails requests instead of hanging them.
use super::{RentalStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{Movie, MoviePatch, NewMovie, NewRental, Rental};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Durable rental store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use rentals::config::PostgresConfig;
/// use rentals::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `movies` table.
#[derive(Debug, Clone, FromRow)]
struct DbMovie {
    id: i64,
    movie_name: String,
    price: i64,
}

impl From<DbMovie> for Movie {
    fn from(row: DbMovie) -> Self {
        Movie {
            id: row.id,
            movie_name: row.movie_name,
            price: row.price,
        }
    }
}

/// Row shape for `rents` joined with its movie.
#[derive(Debug, Clone, FromRow)]
struct DbRental {
    id: i64,
    movie_id: i64,
    charges: i64,
    movie_name: String,
    price: i64,
}

impl From<DbRental> for Rental {
    fn from(row: DbRental) -> Self {
        Rental {
            id: row.id,
            movie_id: row.movie_id,
            charges: row.charges,
            movie: Movie {
                id: row.movie_id,
                movie_name: row.movie_name,
                price: row.price,
            },
        }
    }
}

impl PostgresStore {
    /// Connect to Postgres and apply the embedded migrations.
    ///
    /// # Errors
    /// - Connection, pool setup, or migration failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let store = Self::connect_without_migrations(pg).await?;
        // Fail startup rather than serve handlers against a missing schema.
        sqlx::migrate!("./migrations").run(&store.pool).await?;
        Ok(store)
    }

    async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options);
        let pool = tokio::time::timeout(Duration::from_millis(pg.connect_timeout_ms), pool)
            .await
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("postgres connect timed out")))??;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RentalStore for PostgresStore {
    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, DbMovie>(
            "SELECT id, movie_name, price FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn get_movie(&self, id: i64) -> StoreResult<Movie> {
        sqlx::query_as::<_, DbMovie>("SELECT id, movie_name, price FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Movie::from)
            .ok_or_else(|| StoreError::NotFound(format!("movie {id}")))
    }

    async fn create_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        let row = sqlx::query_as::<_, DbMovie>(
            "INSERT INTO movies (movie_name, price) VALUES ($1, $2) \
             RETURNING id, movie_name, price",
        )
        .bind(&movie.movie_name)
        .bind(movie.price)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        metrics::counter!("rentals_movie_changes_total", "op" => "created").increment(1);
        Ok(row.into())
    }

    async fn patch_movie(&self, id: i64, patch: MoviePatch) -> StoreResult<Movie> {
        // COALESCE keeps columns the patch does not mention.
        let row = sqlx::query_as::<_, DbMovie>(
            "UPDATE movies \
             SET movie_name = COALESCE($2, movie_name), price = COALESCE($3, price) \
             WHERE id = $1 \
             RETURNING id, movie_name, price",
        )
        .bind(id)
        .bind(patch.movie_name.as_deref())
        .bind(patch.price)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?
        .ok_or_else(|| StoreError::NotFound(format!("movie {id}")))?;
        metrics::counter!("rentals_movie_changes_total", "op" => "updated").increment(1);
        Ok(row.into())
    }

    async fn delete_movie(&self, id: i64) -> StoreResult<()> {
        let removed = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(StoreError::NotFound(format!("movie {id}")));
        }
        metrics::counter!("rentals_movie_changes_total", "op" => "deleted").increment(1);
        Ok(())
    }

    async fn list_rentals(&self) -> StoreResult<Vec<Rental>> {
        let rows = sqlx::query_as::<_, DbRental>(
            "SELECT r.id, r.movie_id, r.charges, m.movie_name, m.price \
             FROM rents r JOIN movies m ON m.id = r.movie_id \
             ORDER BY r.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Rental::from).collect())
    }

    async fn create_rental(&self, rental: NewRental) -> StoreResult<Rental> {
        // Insert and join in one statement so the returned movie is the one referenced.
        let row = sqlx::query_as::<_, DbRental>(
            "WITH inserted AS ( \
                 INSERT INTO rents (movie_id, charges) VALUES ($1, $2) \
                 RETURNING id, movie_id, charges \
             ) \
             SELECT i.id, i.movie_id, i.charges, m.movie_name, m.price \
             FROM inserted i JOIN movies m ON m.id = i.movie_id",
        )
        .bind(rental.movie_id)
        .bind(rental.charges)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        metrics::counter!("rentals_rentals_created_total").increment(1);
        Ok(row.into())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn db_error_code(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code.into_owned());
    }
    None
}

/// Map constraint violations to their store-level meaning.
fn classify(err: sqlx::Error) -> StoreError {
    match db_error_code(&err).as_deref() {
        Some(UNIQUE_VIOLATION) => StoreError::Conflict("movie name exists".into()),
        Some(FOREIGN_KEY_VIOLATION) => StoreError::NotFound("referenced movie".into()),
        _ => err.into(),
    }
}
