use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    Idle,
    Active,
    UnderMaintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub vin: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: u32,
    pub status: VehicleStatus,
    /// Weak reference to the driver operating this vehicle, lookup only.
    pub assigned_driver_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
