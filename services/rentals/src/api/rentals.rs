//! Rental handlers.
//!
//! # Purpose
//! List rentals joined with their movie, and rent a movie for a number of days.
//!
//! # Error mapping
//! - Listing failures are 422.
//! - Renting: every failure is 404, including an undecodable body, missing
//!   fields, non-positive `days`, an unknown movie and charge overflow.
use crate::api::error::{ApiError, api_not_found, api_store_error};
use crate::api::types::{RentMovieRequest, RentalListResponse, RentalResponse};
use crate::app::AppState;
use crate::auth::ClaimSet;
use crate::model::NewRental;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};

#[utoipa::path(
    get,
    path = "/rented-movies",
    tag = "rentals",
    responses(
        (status = 200, description = "All rentals with their movie", body = RentalListResponse),
        (status = 422, description = "Rentals could not be loaded", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_rentals(
    State(state): State<AppState>,
) -> Result<Json<RentalListResponse>, ApiError> {
    let movies = state
        .store
        .list_rentals()
        .await
        .map_err(|err| api_store_error(StatusCode::UNPROCESSABLE_ENTITY, "list rentals", &err))?;
    Ok(Json(RentalListResponse {
        success: true,
        movies,
    }))
}

#[utoipa::path(
    post,
    path = "/rent-movie",
    tag = "rentals",
    request_body = RentMovieRequest,
    security(("bearer" = ["rent:movie"])),
    responses(
        (status = 200, description = "Rental created", body = RentalResponse),
        (status = 401, description = "Missing or invalid token", body = crate::auth::error::AuthErrorResponse),
        (status = 403, description = "Permission not granted", body = crate::auth::error::AuthErrorResponse),
        (status = 404, description = "Invalid request, unknown movie or rental failed", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn rent_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    body: Result<Json<RentMovieRequest>, JsonRejection>,
) -> Result<Json<RentalResponse>, ApiError> {
    let Json(body) = body.map_err(|_| api_not_found())?;
    let (Some(movie_id), Some(days)) = (body.movie_id, body.days) else {
        return Err(api_not_found());
    };
    if days <= 0 {
        return Err(api_not_found());
    }
    let movie_id = movie_id.as_id().ok_or_else(api_not_found)?;

    let movie = state
        .store
        .get_movie(movie_id)
        .await
        .map_err(|err| api_store_error(StatusCode::NOT_FOUND, "rent movie", &err))?;
    let Some(charges) = movie.rental_charge(days) else {
        tracing::debug!(movie_id, days, "rental charge overflows");
        return Err(api_not_found());
    };
    let rented_movie = state
        .store
        .create_rental(NewRental { movie_id, charges })
        .await
        .map_err(|err| api_store_error(StatusCode::NOT_FOUND, "rent movie", &err))?;
    tracing::info!(
        rental_id = rented_movie.id,
        movie_id,
        charges,
        subject = ?claims.sub,
        "movie rented"
    );
    Ok(Json(RentalResponse {
        success: true,
        rented_movie,
    }))
}
