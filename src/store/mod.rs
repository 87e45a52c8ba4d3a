use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::FleetError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::Driver;
use crate::models::vehicle::{Vehicle, VehicleStatus};

/// In-memory record store. Assignment and settlement mutate the linked
/// delivery/vehicle pair under both entry guards, always acquired in
/// delivery-then-vehicle order, so readers never observe a half-applied pair.
pub struct MemoryStore {
    drivers: DashMap<Uuid, Driver>,
    vehicles: DashMap<Uuid, Vehicle>,
    deliveries: DashMap<Uuid, Delivery>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VehiclePatch {
    pub vin: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub capacity: Option<u32>,
    pub status: Option<VehicleStatus>,
    pub assigned_driver_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryPatch {
    pub customer_name: Option<String>,
    pub pickup_location: Option<String>,
    pub drop_location: Option<String>,
    pub eta: Option<DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            drivers: DashMap::new(),
            vehicles: DashMap::new(),
            deliveries: DashMap::new(),
        }
    }

    pub fn insert_driver(&self, driver: Driver) {
        self.drivers.insert(driver.id, driver);
    }

    pub fn insert_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id, vehicle);
    }

    pub fn insert_delivery(&self, delivery: Delivery) {
        self.deliveries.insert(delivery.id, delivery);
    }

    pub fn get_driver(&self, id: Uuid) -> Result<Driver, FleetError> {
        self.drivers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FleetError::NotFound(format!("driver {id} not found")))
    }

    pub fn get_vehicle(&self, id: Uuid) -> Result<Vehicle, FleetError> {
        self.vehicles
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {id} not found")))
    }

    pub fn get_delivery(&self, id: Uuid) -> Result<Delivery, FleetError> {
        self.deliveries
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FleetError::NotFound(format!("delivery {id} not found")))
    }

    pub fn list_drivers(&self) -> Vec<Driver> {
        self.drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn list_vehicles(&self) -> Vec<Vehicle> {
        self.vehicles
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn list_deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.len()
    }

    pub fn update_vehicle(&self, id: Uuid, patch: VehiclePatch) -> Result<Vehicle, FleetError> {
        let mut vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {id} not found")))?;

        if let Some(vin) = patch.vin {
            vehicle.vin = vin;
        }
        if let Some(vehicle_type) = patch.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        if let Some(capacity) = patch.capacity {
            vehicle.capacity = capacity;
        }
        if let Some(status) = patch.status {
            vehicle.status = status;
        }
        if let Some(driver_id) = patch.assigned_driver_id {
            vehicle.assigned_driver_id = Some(driver_id);
        }
        vehicle.updated_at = Utc::now();

        Ok(vehicle.clone())
    }

    pub fn update_delivery(&self, id: Uuid, patch: DeliveryPatch) -> Result<Delivery, FleetError> {
        let mut delivery = self
            .deliveries
            .get_mut(&id)
            .ok_or_else(|| FleetError::NotFound(format!("delivery {id} not found")))?;

        if let Some(customer_name) = patch.customer_name {
            delivery.customer_name = customer_name;
        }
        if let Some(pickup_location) = patch.pickup_location {
            delivery.pickup_location = pickup_location;
        }
        if let Some(drop_location) = patch.drop_location {
            delivery.drop_location = drop_location;
        }
        if let Some(eta) = patch.eta {
            delivery.eta = eta;
        }

        Ok(delivery.clone())
    }

    /// Atomically locks a Pending delivery onto an Idle vehicle. Preconditions
    /// are checked in order under the guards; the first failing one wins. No
    /// await point exists between the two writes, so a cancelled caller cannot
    /// leave the pair half-applied.
    pub fn assign_pair(
        &self,
        delivery_id: Uuid,
        vehicle_id: Uuid,
    ) -> Result<(Delivery, Vehicle), FleetError> {
        let mut delivery = self
            .deliveries
            .get_mut(&delivery_id)
            .ok_or_else(|| FleetError::NotFound(format!("delivery {delivery_id} not found")))?;

        if delivery.status != DeliveryStatus::Pending {
            return Err(FleetError::AlreadyAssigned(delivery_id));
        }

        let mut vehicle = self
            .vehicles
            .get_mut(&vehicle_id)
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {vehicle_id} not found")))?;

        if vehicle.status != VehicleStatus::Idle {
            return Err(FleetError::VehicleUnavailable(vehicle_id));
        }

        delivery.status = DeliveryStatus::InTransit;
        delivery.assigned_vehicle_id = Some(vehicle_id);
        vehicle.status = VehicleStatus::Active;
        vehicle.updated_at = Utc::now();

        Ok((delivery.clone(), vehicle.clone()))
    }

    /// External settlement of an assigned delivery. Completion retains the
    /// vehicle reference on the delivery and releases the vehicle to Idle;
    /// a delay keeps the vehicle Active.
    pub fn settle_pair(
        &self,
        delivery_id: Uuid,
        new_status: DeliveryStatus,
    ) -> Result<(Delivery, Option<Vehicle>), FleetError> {
        let mut delivery = self
            .deliveries
            .get_mut(&delivery_id)
            .ok_or_else(|| FleetError::NotFound(format!("delivery {delivery_id} not found")))?;

        match (delivery.status, new_status) {
            (DeliveryStatus::InTransit, DeliveryStatus::Delayed) => {
                delivery.status = DeliveryStatus::Delayed;
                Ok((delivery.clone(), None))
            }
            (
                DeliveryStatus::InTransit | DeliveryStatus::Delayed,
                DeliveryStatus::Completed,
            ) => {
                let vehicle_id = delivery.assigned_vehicle_id.ok_or_else(|| {
                    FleetError::Internal(format!(
                        "delivery {delivery_id} is {:?} without a vehicle",
                        delivery.status
                    ))
                })?;
                let mut vehicle = self.vehicles.get_mut(&vehicle_id).ok_or_else(|| {
                    FleetError::NotFound(format!("vehicle {vehicle_id} not found"))
                })?;

                delivery.status = DeliveryStatus::Completed;
                vehicle.status = VehicleStatus::Idle;
                vehicle.updated_at = Utc::now();

                Ok((delivery.clone(), Some(vehicle.clone())))
            }
            (from, to) => Err(FleetError::InvalidTransition { from, to }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
