use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access;
use crate::error::FleetError;
use crate::models::driver::Driver;
use crate::models::event::{FleetEvent, SystemEventKind};
use crate::models::identity::{CallerIdentity, Role};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::state::AppState;
use crate::store::VehiclePatch;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fleet", get(list_fleet))
        .route("/api/fleet/vehicles", post(create_vehicle))
        .route("/api/fleet/vehicles/:id", patch(update_vehicle))
}

#[derive(Deserialize)]
pub struct CreateVehicleRequest {
    pub vin: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: u32,
    pub driver_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct FleetVehicle {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub driver: Option<Driver>,
}

async fn list_fleet(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<Vec<FleetVehicle>>, FleetError> {
    if caller.role == Role::Unknown {
        return Err(FleetError::Forbidden(
            "caller role is not recognized".to_string(),
        ));
    }

    let drivers = state.store.list_drivers();
    let vehicles = state.store.list_vehicles();
    let deliveries = state.store.list_deliveries();
    let scoped = access::scope(&caller, &drivers, vehicles, deliveries);

    let fleet = scoped
        .vehicles
        .into_iter()
        .map(|vehicle| {
            let driver = vehicle
                .assigned_driver_id
                .and_then(|id| drivers.iter().find(|d| d.id == id).cloned());
            FleetVehicle { vehicle, driver }
        })
        .collect();

    Ok(Json(fleet))
}

async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<Json<Vehicle>, FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "vehicle registration requires an elevated role".to_string(),
        ));
    }

    if payload.vin.trim().is_empty() {
        return Err(FleetError::BadRequest("vin cannot be empty".to_string()));
    }

    if payload.capacity == 0 {
        return Err(FleetError::BadRequest("capacity must be > 0".to_string()));
    }

    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        vin: payload.vin,
        vehicle_type: payload.vehicle_type,
        capacity: payload.capacity,
        status: VehicleStatus::Idle,
        assigned_driver_id: payload.driver_id,
        updated_at: Utc::now(),
    };

    state.store.insert_vehicle(vehicle.clone());
    state.hub.publish(FleetEvent::System {
        kind: SystemEventKind::NewVehicle,
        message: format!("Vehicle {} registered.", vehicle.vin),
    });

    Ok(Json(vehicle))
}

async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(patch): Json<VehiclePatch>,
) -> Result<Json<Vehicle>, FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "vehicle updates require an elevated role".to_string(),
        ));
    }

    let vehicle = state.store.update_vehicle(id, patch)?;
    Ok(Json(vehicle))
}
