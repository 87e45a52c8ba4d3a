use crate::models::delivery::Delivery;
use crate::models::driver::Driver;
use crate::models::identity::{CallerIdentity, Role};
use crate::models::vehicle::Vehicle;

#[derive(Debug, Default)]
pub struct Scoped {
    pub vehicles: Vec<Vehicle>,
    pub deliveries: Vec<Delivery>,
}

/// Narrows a record set to what the caller may see. Elevated roles pass
/// through unchanged; a driver sees only their own vehicle and its
/// deliveries. Total: an unresolved identity yields the empty scope.
pub fn scope(
    caller: &CallerIdentity,
    drivers: &[Driver],
    vehicles: Vec<Vehicle>,
    deliveries: Vec<Delivery>,
) -> Scoped {
    if caller.role.is_elevated() {
        return Scoped {
            vehicles,
            deliveries,
        };
    }

    if caller.role != Role::Driver {
        return Scoped::default();
    }

    let Some(driver) = drivers
        .iter()
        .find(|d| d.owning_caller_id == Some(caller.caller_id))
    else {
        return Scoped::default();
    };

    let Some(vehicle) = vehicles
        .into_iter()
        .find(|v| v.assigned_driver_id == Some(driver.id))
    else {
        return Scoped::default();
    };

    let deliveries = deliveries
        .into_iter()
        .filter(|d| d.assigned_vehicle_id == Some(vehicle.id))
        .collect();

    Scoped {
        vehicles: vec![vehicle],
        deliveries,
    }
}
