//! Rental service HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, attaches the per-route permission guards and the
//! shared middleware, and defines the application state injected into handlers.
//!
//! # Notes
//! - Guards are attached per handler so `PATCH` and `DELETE` on the same path
//!   can require different permissions.
//! - Router-generated 405s and unmatched paths are rewritten to the JSON error shape.
use crate::api;
use crate::api::error::{ApiError, api_method_not_allowed, api_not_found};
use crate::api::openapi::ApiDoc;
use crate::auth::middleware::{RequirePermission, authorize};
use crate::auth::permissions::{CREATE_MOVIE, DELETE_MOVIE, RENT_MOVIE, UPDATE_MOVIE};
use crate::auth::validator::TokenValidator;
use crate::observability;
use crate::store::RentalStore;
use axum::handler::Handler;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RentalStore>,
    pub token_validator: TokenValidator,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    let validator = state.token_validator.clone();
    let require = move |permission: &'static str| {
        middleware::from_fn_with_state(
            RequirePermission::new(validator.clone(), permission),
            authorize,
        )
    };

    Router::new()
        .route("/", get(api::system::index))
        .route("/health", get(api::system::health))
        .route("/movies", get(api::movies::list_movies))
        .route(
            "/create-movie",
            post(api::movies::create_movie.layer(require(CREATE_MOVIE))),
        )
        .route(
            "/movie/:id",
            patch(api::movies::update_movie.layer(require(UPDATE_MOVIE)))
                .delete(api::movies::delete_movie.layer(require(DELETE_MOVIE))),
        )
        .route("/rented-movies", get(api::rentals::list_rentals))
        .route(
            "/rent-movie",
            post(api::rentals::rent_movie.layer(require(RENT_MOVIE))),
        )
        .route("/openapi.json", get(openapi_json))
        .fallback(not_found)
        .layer(middleware::map_response(json_method_not_allowed))
        .layer(cors_layer())
        .layer(trace_layer)
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found() -> ApiError {
    api_not_found()
}

/// Give router-generated 405s a JSON body, keeping the `Allow` header.
async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow: Option<HeaderValue> = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = api_method_not_allowed().into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}
