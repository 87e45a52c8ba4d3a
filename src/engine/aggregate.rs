use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::access;
use crate::error::FleetError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::Driver;
use crate::models::identity::{CallerIdentity, Role};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct DriverRollup {
    pub name: String,
    pub completed: u32,
    pub active: u32,
    pub delayed: u32,
}

#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub active_deliveries: usize,
    pub idle_vehicles: usize,
    pub delayed_shipments: usize,
    pub total_vehicles: usize,
    pub total_deliveries: usize,
    pub driver_stats: Vec<DriverRollup>,
}

/// Snapshot of operational counts, computed on the caller's visible scope.
/// The per-driver rollup is a team-wide breakdown and is only included for
/// elevated callers; drivers see their own totals through the counts alone.
pub fn dashboard(
    state: &AppState,
    caller: &CallerIdentity,
) -> Result<DashboardMetrics, FleetError> {
    if caller.role == Role::Unknown {
        return Err(FleetError::Forbidden(
            "caller role is not recognized".to_string(),
        ));
    }

    let drivers = state.store.list_drivers();
    let vehicles = state.store.list_vehicles();
    let deliveries = state.store.list_deliveries();

    let driver_stats = if caller.role.is_elevated() {
        rollup_by_driver(&drivers, &vehicles, &deliveries)
    } else {
        Vec::new()
    };

    let scoped = access::scope(caller, &drivers, vehicles, deliveries);

    Ok(DashboardMetrics {
        active_deliveries: scoped
            .deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::InTransit)
            .count(),
        idle_vehicles: scoped
            .vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::Idle)
            .count(),
        delayed_shipments: scoped
            .deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::Delayed)
            .count(),
        total_vehicles: scoped.vehicles.len(),
        total_deliveries: scoped.deliveries.len(),
        driver_stats,
    })
}

fn rollup_by_driver(
    drivers: &[Driver],
    vehicles: &[Vehicle],
    deliveries: &[Delivery],
) -> Vec<DriverRollup> {
    let mut stats: HashMap<Uuid, DriverRollup> = drivers
        .iter()
        .map(|d| {
            (
                d.id,
                DriverRollup {
                    name: d.name.clone(),
                    completed: 0,
                    active: 0,
                    delayed: 0,
                },
            )
        })
        .collect();

    for delivery in deliveries {
        let Some(vehicle_id) = delivery.assigned_vehicle_id else {
            continue;
        };
        let Some(vehicle) = vehicles.iter().find(|v| v.id == vehicle_id) else {
            continue;
        };
        let Some(driver_id) = vehicle.assigned_driver_id else {
            continue;
        };
        let Some(entry) = stats.get_mut(&driver_id) else {
            continue;
        };

        match delivery.status {
            DeliveryStatus::Completed => entry.completed += 1,
            DeliveryStatus::Delayed => entry.delayed += 1,
            _ => entry.active += 1,
        }
    }

    stats.into_values().collect()
}
