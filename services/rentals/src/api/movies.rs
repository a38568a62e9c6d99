//! Movie catalog handlers.
//!
//! # Purpose
//! List, create, patch and delete catalog items. Writes are guarded by the
//! route layer in [`crate::app`]; handlers only see the verified claims.
//!
//! # Error mapping
//! - Undecodable JSON bodies are 400.
//! - Missing create fields and duplicate names are 422.
//! - Unknown or non-integer ids are 404.
//! - An empty catalog is 404 rather than an empty list.
use crate::api::error::{
    ApiError, api_bad_request, api_not_found, api_store_error, api_unprocessable,
};
use crate::api::types::{CreateMovieRequest, MovieDeletedResponse, MovieListResponse, MovieResponse};
use crate::app::AppState;
use crate::auth::ClaimSet;
use crate::model::{MoviePatch, NewMovie};
use crate::store::StoreError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

#[utoipa::path(
    get,
    path = "/movies",
    tag = "movies",
    responses(
        (status = 200, description = "All movies ordered by id", body = MovieListResponse),
        (status = 404, description = "Catalog is empty", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_movies(
    State(state): State<AppState>,
) -> Result<Json<MovieListResponse>, ApiError> {
    let movies = state
        .store
        .list_movies()
        .await
        .map_err(|err| api_store_error(StatusCode::UNPROCESSABLE_ENTITY, "list movies", &err))?;
    if movies.is_empty() {
        return Err(api_not_found());
    }
    Ok(Json(MovieListResponse {
        success: true,
        movies,
    }))
}

#[utoipa::path(
    post,
    path = "/create-movie",
    tag = "movies",
    request_body = CreateMovieRequest,
    security(("bearer" = ["create:movie"])),
    responses(
        (status = 200, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Body is not valid JSON", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::auth::error::AuthErrorResponse),
        (status = 403, description = "Permission not granted", body = crate::auth::error::AuthErrorResponse),
        (status = 422, description = "Missing field or duplicate name", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    body: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let Json(body) = body.map_err(|_| api_bad_request())?;
    let (Some(movie_name), Some(price)) = (body.movie_name, body.price) else {
        return Err(api_unprocessable());
    };
    let movie = state
        .store
        .create_movie(NewMovie { movie_name, price })
        .await
        .map_err(|err| api_store_error(StatusCode::UNPROCESSABLE_ENTITY, "create movie", &err))?;
    tracing::info!(movie_id = movie.id, subject = ?claims.sub, "movie created");
    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

#[utoipa::path(
    patch,
    path = "/movie/{id}",
    tag = "movies",
    params(
        ("id" = i64, Path, description = "Movie identifier")
    ),
    request_body = MoviePatch,
    security(("bearer" = ["update:movie"])),
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Body is not valid JSON or names no field", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::auth::error::AuthErrorResponse),
        (status = 403, description = "Permission not granted", body = crate::auth::error::AuthErrorResponse),
        (status = 404, description = "Movie not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<MoviePatch>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let Path(id) = id.map_err(|_| api_not_found())?;
    let Json(patch) = body.map_err(|_| api_bad_request())?;
    if patch.is_empty() {
        return Err(api_bad_request());
    }
    let movie = state
        .store
        .patch_movie(id, patch)
        .await
        .map_err(|err| match err {
            StoreError::NotFound(_) => api_store_error(StatusCode::NOT_FOUND, "patch movie", &err),
            _ => api_store_error(StatusCode::UNPROCESSABLE_ENTITY, "patch movie", &err),
        })?;
    tracing::info!(movie_id = movie.id, subject = ?claims.sub, "movie updated");
    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

#[utoipa::path(
    delete,
    path = "/movie/{id}",
    tag = "movies",
    params(
        ("id" = i64, Path, description = "Movie identifier")
    ),
    security(("bearer" = ["delete:movie"])),
    responses(
        (status = 200, description = "Movie and its rentals deleted", body = MovieDeletedResponse),
        (status = 401, description = "Missing or invalid token", body = crate::auth::error::AuthErrorResponse),
        (status = 403, description = "Permission not granted", body = crate::auth::error::AuthErrorResponse),
        (status = 404, description = "Movie not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<ClaimSet>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MovieDeletedResponse>, ApiError> {
    let Path(id) = id.map_err(|_| api_not_found())?;
    state.store.delete_movie(id).await.map_err(|err| match err {
        StoreError::NotFound(_) => api_store_error(StatusCode::NOT_FOUND, "delete movie", &err),
        _ => api_store_error(StatusCode::UNPROCESSABLE_ENTITY, "delete movie", &err),
    })?;
    tracing::info!(movie_id = id, subject = ?claims.sub, "movie deleted");
    Ok(Json(MovieDeletedResponse { success: true, id }))
}
