use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::FleetError;
use crate::models::driver::Driver;
use crate::models::identity::CallerIdentity;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/drivers", post(create_driver).get(list_drivers))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub phone: String,
    pub owning_caller_id: Option<Uuid>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "driver registration requires an elevated role".to_string(),
        ));
    }

    if payload.name.trim().is_empty() {
        return Err(FleetError::BadRequest("name cannot be empty".to_string()));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name,
        phone: payload.phone,
        owning_caller_id: payload.owning_caller_id,
        created_at: Utc::now(),
    };

    state.store.insert_driver(driver.clone());
    Ok(Json(driver))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Driver>>, FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "driver roster requires an elevated role".to_string(),
        ));
    }

    Ok(Json(state.store.list_drivers()))
}
