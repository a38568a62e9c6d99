//! OpenAPI schema aggregation for the rental API.
//!
//! # Purpose
//! Collects all routes and schema types into the document served at
//! `/openapi.json`, including the bearer security scheme guarded routes use.
use crate::api::{
    movies, rentals, system,
    types::{
        CreateMovieRequest, ErrorResponse, HealthStatus, MovieDeletedResponse, MovieIdInput,
        MovieListResponse, MovieResponse, RentMovieRequest, RentalListResponse, RentalResponse,
        StoreHealth,
    },
};
use crate::auth::error::AuthErrorResponse;
use crate::model::{Movie, MoviePatch, Rental};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "rentals",
        version = "v1",
        description = "Movie catalog and rental HTTP API"
    ),
    paths(
        system::index,
        system::health,
        movies::list_movies,
        movies::create_movie,
        movies::update_movie,
        movies::delete_movie,
        rentals::list_rentals,
        rentals::rent_movie
    ),
    components(schemas(
        HealthStatus,
        StoreHealth,
        ErrorResponse,
        AuthErrorResponse,
        Movie,
        MoviePatch,
        Rental,
        CreateMovieRequest,
        MovieListResponse,
        MovieResponse,
        MovieDeletedResponse,
        MovieIdInput,
        RentMovieRequest,
        RentalListResponse,
        RentalResponse
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "system", description = "Liveness and readiness"),
        (name = "movies", description = "Movie catalog"),
        (name = "rentals", description = "Movie rentals")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
