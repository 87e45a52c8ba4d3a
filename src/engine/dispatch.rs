use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::error::FleetError;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::event::{FleetEvent, SystemEventKind};
use crate::models::identity::CallerIdentity;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;

/// Locks a Pending delivery onto an Idle vehicle and announces the
/// assignment. The pair transition itself is atomic inside the store.
pub fn assign(
    state: &AppState,
    caller: &CallerIdentity,
    delivery_id: Uuid,
    vehicle_id: Uuid,
) -> Result<(Delivery, Vehicle), FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "assignment requires an elevated role".to_string(),
        ));
    }

    let start = Instant::now();
    let result = state.store.assign_pair(delivery_id, vehicle_id);

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .assignment_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    let (delivery, vehicle) = result?;

    state.hub.publish(FleetEvent::System {
        kind: SystemEventKind::Assignment,
        message: format!("Vehicle assigned to delivery #{}", delivery.id),
    });

    info!(
        delivery_id = %delivery.id,
        vehicle_id = %vehicle.id,
        "delivery assigned"
    );

    Ok((delivery, vehicle))
}

/// External settlement path: a delay signal or completion for a delivery
/// already on the road. Routed through the store's pair transition so the
/// vehicle link stays consistent.
pub fn update_status(
    state: &AppState,
    caller: &CallerIdentity,
    delivery_id: Uuid,
    new_status: DeliveryStatus,
) -> Result<Delivery, FleetError> {
    if !caller.role.is_elevated() {
        return Err(FleetError::Forbidden(
            "status edits require an elevated role".to_string(),
        ));
    }

    let (delivery, released) = state.store.settle_pair(delivery_id, new_status)?;

    if let Some(vehicle) = &released {
        info!(vehicle_id = %vehicle.id, "vehicle released to idle");
    }
    info!(delivery_id = %delivery.id, status = ?delivery.status, "delivery status updated");

    Ok(delivery)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::{assign, update_status};
    use crate::error::FleetError;
    use crate::models::delivery::{Delivery, DeliveryStatus};
    use crate::models::event::{FleetEvent, SystemEventKind};
    use crate::models::identity::{CallerIdentity, Role};
    use crate::models::vehicle::{Vehicle, VehicleStatus};
    use crate::state::AppState;

    fn admin() -> CallerIdentity {
        CallerIdentity {
            caller_id: Uuid::from_u128(1000),
            role: Role::Admin,
        }
    }

    fn seed_vehicle(state: &AppState, id_seed: u128) -> Uuid {
        let id = Uuid::from_u128(id_seed);
        state.store.insert_vehicle(Vehicle {
            id,
            vin: format!("VIN-{id_seed}"),
            vehicle_type: "Van".to_string(),
            capacity: 600,
            status: VehicleStatus::Idle,
            assigned_driver_id: None,
            updated_at: Utc::now(),
        });
        id
    }

    fn seed_delivery(state: &AppState, id_seed: u128) -> Uuid {
        let id = Uuid::from_u128(id_seed);
        state.store.insert_delivery(Delivery {
            id,
            customer_name: "Soylent Corp".to_string(),
            pickup_location: "Depot South".to_string(),
            drop_location: "Harbor Rd 2".to_string(),
            pickup: None,
            dropoff: None,
            eta: Utc::now(),
            status: DeliveryStatus::Pending,
            assigned_vehicle_id: None,
            created_at: Utc::now(),
        });
        id
    }

    fn vehicle_link_invariant_holds(state: &AppState) -> bool {
        state.store.list_deliveries().iter().all(|d| {
            d.assigned_vehicle_id.is_some() == (d.status != DeliveryStatus::Pending)
        })
    }

    #[test]
    fn driver_caller_is_rejected() {
        let state = AppState::new(8);
        let v = seed_vehicle(&state, 1);
        let d = seed_delivery(&state, 2);

        let caller = CallerIdentity {
            caller_id: Uuid::from_u128(1000),
            role: Role::Driver,
        };
        let err = assign(&state, &caller, d, v).unwrap_err();
        assert!(matches!(err, FleetError::Forbidden(_)));
        assert!(vehicle_link_invariant_holds(&state));
    }

    #[test]
    fn successful_assignment_publishes_event() {
        let state = AppState::new(8);
        let v = seed_vehicle(&state, 1);
        let d = seed_delivery(&state, 2);
        let (_handle, mut rx) = state.hub.subscribe();

        assign(&state, &admin(), d, v).unwrap();

        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event,
            FleetEvent::System {
                kind: SystemEventKind::Assignment,
                ..
            }
        ));
        assert!(vehicle_link_invariant_holds(&state));
    }

    #[test]
    fn reassigning_leaves_state_untouched() {
        let state = AppState::new(8);
        let v1 = seed_vehicle(&state, 1);
        let v2 = seed_vehicle(&state, 2);
        let d = seed_delivery(&state, 3);

        assign(&state, &admin(), d, v1).unwrap();
        let err = assign(&state, &admin(), d, v2).unwrap_err();
        assert!(matches!(err, FleetError::AlreadyAssigned(_)));

        let delivery = state.store.get_delivery(d).unwrap();
        assert_eq!(delivery.assigned_vehicle_id, Some(v1));
        assert_eq!(
            state.store.get_vehicle(v2).unwrap().status,
            VehicleStatus::Idle
        );
        assert!(vehicle_link_invariant_holds(&state));
    }

    #[tokio::test]
    async fn concurrent_assigns_of_same_delivery_have_one_winner() {
        let state = Arc::new(AppState::new(8));
        let v1 = seed_vehicle(&state, 1);
        let v2 = seed_vehicle(&state, 2);
        let d = seed_delivery(&state, 3);

        let s1 = state.clone();
        let s2 = state.clone();
        let t1 = tokio::task::spawn_blocking(move || assign(&s1, &admin(), d, v1));
        let t2 = tokio::task::spawn_blocking(move || assign(&s2, &admin(), d, v2));

        let r1 = t1.await.unwrap();
        let r2 = t2.await.unwrap();

        let successes = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(
            loser.unwrap_err(),
            FleetError::AlreadyAssigned(_)
        ));
        assert!(vehicle_link_invariant_holds(&state));
    }

    #[tokio::test]
    async fn concurrent_assigns_of_same_vehicle_have_one_winner() {
        let state = Arc::new(AppState::new(8));
        let v = seed_vehicle(&state, 1);
        let d1 = seed_delivery(&state, 2);
        let d2 = seed_delivery(&state, 3);

        let s1 = state.clone();
        let s2 = state.clone();
        let t1 = tokio::task::spawn_blocking(move || assign(&s1, &admin(), d1, v));
        let t2 = tokio::task::spawn_blocking(move || assign(&s2, &admin(), d2, v));

        let r1 = t1.await.unwrap();
        let r2 = t2.await.unwrap();

        let successes = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(
            loser.unwrap_err(),
            FleetError::VehicleUnavailable(_)
        ));

        // The losing delivery is still Pending and unlinked.
        let d1_state = state.store.get_delivery(d1).unwrap();
        let d2_state = state.store.get_delivery(d2).unwrap();
        assert!(d1_state.assigned_vehicle_id.is_none() || d2_state.assigned_vehicle_id.is_none());
        assert!(vehicle_link_invariant_holds(&state));
    }

    #[test]
    fn completion_flow_releases_the_vehicle() {
        let state = AppState::new(8);
        let v = seed_vehicle(&state, 1);
        let d = seed_delivery(&state, 2);

        assign(&state, &admin(), d, v).unwrap();
        let delayed = update_status(&state, &admin(), d, DeliveryStatus::Delayed).unwrap();
        assert_eq!(delayed.status, DeliveryStatus::Delayed);

        let completed = update_status(&state, &admin(), d, DeliveryStatus::Completed).unwrap();
        assert_eq!(completed.status, DeliveryStatus::Completed);
        assert_eq!(completed.assigned_vehicle_id, Some(v));
        assert_eq!(
            state.store.get_vehicle(v).unwrap().status,
            VehicleStatus::Idle
        );
        assert!(vehicle_link_invariant_holds(&state));
    }
}
