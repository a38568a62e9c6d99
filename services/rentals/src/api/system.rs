//! Liveness and readiness handlers.
//!
//! # Key invariants and assumptions
//! - `/` never touches the store; it answers as long as the process serves HTTP.
//! - `/health` probes the store and reports which backend is in use.
use crate::api::error::{ApiError, api_store_error};
use crate::api::types::{HealthStatus, StoreHealth};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthStatus)
    )
)]
pub(crate) async fn index() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "App is working fine.".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Store reachable", body = StoreHealth),
        (status = 422, description = "Store unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn health(State(state): State<AppState>) -> Result<Json<StoreHealth>, ApiError> {
    state
        .store
        .health_check()
        .await
        .map_err(|err| api_store_error(StatusCode::UNPROCESSABLE_ENTITY, "health check", &err))?;
    Ok(Json(StoreHealth {
        status: "ok".to_string(),
        backend: state.store.backend_name().to_string(),
        durable: state.store.is_durable(),
    }))
}
