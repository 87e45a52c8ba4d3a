use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::delivery::DeliveryStatus;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("delivery {0} is not pending")]
    AlreadyAssigned(Uuid),

    #[error("vehicle {0} is not idle")]
    VehicleUnavailable(Uuid),

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let status = match &self {
            FleetError::NotFound(_) => StatusCode::NOT_FOUND,
            FleetError::Forbidden(_) => StatusCode::FORBIDDEN,
            FleetError::AlreadyAssigned(_)
            | FleetError::VehicleUnavailable(_)
            | FleetError::InvalidTransition { .. } => StatusCode::CONFLICT,
            FleetError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FleetError::BadRequest(_) => StatusCode::BAD_REQUEST,
            FleetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
