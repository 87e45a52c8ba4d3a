use serde::Serialize;

use crate::geo::haversine_km;
use crate::models::delivery::Delivery;

const CONGESTION_RISK_MAX: u128 = 80;
const DISTANCE_RISK_MAX: f64 = 20.0;
const ROUTE_CAP_KM: f64 = 120.0;

const CRITICAL_THRESHOLD: f64 = 70.0;
const WARNING_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskCategory {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub category: RiskCategory,
    pub narrative: &'static str,
}

/// Pure function of the delivery's attributes: no clock, no randomness, no
/// store access. Category and narrative are both derived from the single
/// score, so they can never disagree.
pub fn estimate(delivery: &Delivery) -> RiskAssessment {
    let score = (congestion_risk(delivery) + distance_risk(delivery)).clamp(0.0, 100.0);
    let category = categorize(score);

    RiskAssessment {
        score,
        category,
        narrative: narrative_for(category),
    }
}

fn congestion_risk(delivery: &Delivery) -> f64 {
    // Stand-in for a live traffic feed, keyed off the delivery identity so
    // repeated estimates of the same delivery agree.
    (delivery.id.as_u128() % (CONGESTION_RISK_MAX + 1)) as f64
}

fn distance_risk(delivery: &Delivery) -> f64 {
    match (&delivery.pickup, &delivery.dropoff) {
        (Some(pickup), Some(dropoff)) => {
            let route_km = haversine_km(pickup, dropoff).min(ROUTE_CAP_KM);
            route_km / ROUTE_CAP_KM * DISTANCE_RISK_MAX
        }
        _ => DISTANCE_RISK_MAX,
    }
}

fn categorize(score: f64) -> RiskCategory {
    if score > CRITICAL_THRESHOLD {
        RiskCategory::Critical
    } else if score > WARNING_THRESHOLD {
        RiskCategory::Warning
    } else {
        RiskCategory::Healthy
    }
}

fn narrative_for(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::Critical => "High probability of 45min delay",
        RiskCategory::Warning => "Congestion building along route; ETA at risk",
        RiskCategory::Healthy => "Route optimization optimal",
    }
}
