pub mod dashboard;
pub mod deliveries;
pub mod drivers;
pub mod fleet;
pub mod ws;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::error::FleetError;
use crate::models::identity::{CallerIdentity, Role};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(dashboard::router())
        .merge(drivers::router())
        .merge(fleet::router())
        .merge(deliveries::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

// Session verification is external; requests arrive with an already-issued
// caller identity in headers. A missing or malformed id fails closed.
#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = FleetError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller_id = parts
            .headers
            .get("x-caller-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| {
                FleetError::Forbidden("missing or invalid x-caller-id header".to_string())
            })?;

        let role = parts
            .headers
            .get("x-caller-role")
            .and_then(|value| value.to_str().ok())
            .map(Role::parse)
            .unwrap_or(Role::Unknown);

        Ok(CallerIdentity { caller_id, role })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: usize,
    vehicles: usize,
    deliveries: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        drivers: state.store.driver_count(),
        vehicles: state.store.vehicle_count(),
        deliveries: state.store.delivery_count(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
