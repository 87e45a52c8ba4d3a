use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    /// Lookup key back to the caller identity that may act as this driver.
    pub owning_caller_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
