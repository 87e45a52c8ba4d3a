use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::vehicle::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemEventKind {
    NewVehicle,
    NewDelivery,
    Assignment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FleetEvent {
    LocationUpdate {
        vehicle_id: Uuid,
        location: GeoPoint,
        recorded_at: DateTime<Utc>,
    },
    System {
        kind: SystemEventKind,
        message: String,
    },
}

impl FleetEvent {
    pub fn kind_label(&self) -> &'static str {
        match self {
            FleetEvent::LocationUpdate { .. } => "location_update",
            FleetEvent::System { kind, .. } => match kind {
                SystemEventKind::NewVehicle => "new_vehicle",
                SystemEventKind::NewDelivery => "new_delivery",
                SystemEventKind::Assignment => "assignment",
            },
        }
    }
}
