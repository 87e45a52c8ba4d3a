use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::vehicle::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delayed,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub customer_name: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub pickup: Option<GeoPoint>,
    pub dropoff: Option<GeoPoint>,
    pub eta: DateTime<Utc>,
    pub status: DeliveryStatus,
    /// Non-null exactly when status is InTransit, Delayed or Completed.
    pub assigned_vehicle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
