use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::access;
use crate::engine::dispatch;
use crate::error::FleetError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::event::{FleetEvent, SystemEventKind};
use crate::models::identity::{CallerIdentity, Role};
use crate::models::vehicle::GeoPoint;
use crate::risk::{self, RiskAssessment};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/deliveries", post(create_delivery).get(list_deliveries))
        .route("/api/deliveries/:id/assign", post(assign_delivery))
        .route("/api/deliveries/:id/status", post(update_delivery_status))
}

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub customer_name: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub pickup: Option<GeoPoint>,
    pub dropoff: Option<GeoPoint>,
    pub eta: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AssignDeliveryRequest {
    pub vehicle_id: Uuid,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DeliveryStatus,
}

#[derive(Serialize)]
pub struct DeliveryWithRisk {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub risk: RiskAssessment,
}

async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<Vec<DeliveryWithRisk>>, FleetError> {
    if caller.role == Role::Unknown {
        return Err(FleetError::Forbidden(
            "caller role is not recognized".to_string(),
        ));
    }

    let drivers = state.store.list_drivers();
    let vehicles = state.store.list_vehicles();
    let deliveries = state.store.list_deliveries();
    let scoped = access::scope(&caller, &drivers, vehicles, deliveries);

    let enriched = scoped
        .deliveries
        .into_iter()
        .map(|delivery| DeliveryWithRisk {
            risk: risk::estimate(&delivery),
            delivery,
        })
        .collect();

    Ok(Json(enriched))
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<Json<Delivery>, FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "delivery creation requires an elevated role".to_string(),
        ));
    }

    if payload.customer_name.trim().is_empty() {
        return Err(FleetError::BadRequest(
            "customer_name cannot be empty".to_string(),
        ));
    }

    let delivery = Delivery {
        id: Uuid::new_v4(),
        customer_name: payload.customer_name,
        pickup_location: payload.pickup_location,
        drop_location: payload.drop_location,
        pickup: payload.pickup,
        dropoff: payload.dropoff,
        eta: payload.eta,
        status: DeliveryStatus::Pending,
        assigned_vehicle_id: None,
        created_at: Utc::now(),
    };

    state.store.insert_delivery(delivery.clone());
    state.hub.publish(FleetEvent::System {
        kind: SystemEventKind::NewDelivery,
        message: format!("Order for {} created.", delivery.customer_name),
    });

    Ok(Json(delivery))
}

async fn assign_delivery(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignDeliveryRequest>,
) -> Result<Json<Value>, FleetError> {
    dispatch::assign(&state, &caller, id, payload.vehicle_id)?;
    Ok(Json(json!({ "success": true })))
}

async fn update_delivery_status(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Delivery>, FleetError> {
    let delivery = dispatch::update_status(&state, &caller, id, payload.status)?;
    Ok(Json(delivery))
}
