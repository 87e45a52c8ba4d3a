use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::engine::aggregate::{self, DashboardMetrics};
use crate::error::FleetError;
use crate::models::identity::CallerIdentity;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard/stats", get(dashboard_stats))
}

async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<Json<DashboardMetrics>, FleetError> {
    let metrics = aggregate::dashboard(&state, &caller)?;
    Ok(Json(metrics))
}
