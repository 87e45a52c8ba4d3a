use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::event::FleetEvent;
use crate::models::identity::CallerIdentity;
use crate::models::vehicle::GeoPoint;
use crate::state::AppState;

#[derive(Deserialize)]
struct LocationReport {
    vehicle_id: Uuid,
    location: GeoPoint,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    caller: CallerIdentity,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, caller, state))
}

async fn handle_socket(socket: WebSocket, caller: CallerIdentity, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (handle, rx) = state.hub.subscribe();

    info!(caller_id = %caller.caller_id, "observer connected");

    let mut send_task = tokio::spawn(async move {
        let mut events = ReceiverStream::new(rx);
        while let Some(event) = events.next().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound messages are vehicle position telemetry. They go straight to
    // the hub; no status invariant is involved.
    let telemetry_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                match serde_json::from_str::<LocationReport>(&text) {
                    Ok(report) => telemetry_state.hub.publish(FleetEvent::LocationUpdate {
                        vehicle_id: report.vehicle_id,
                        location: report.location,
                        recorded_at: Utc::now(),
                    }),
                    Err(err) => warn!(error = %err, "ignoring malformed location report"),
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.unsubscribe(&handle);
    info!(caller_id = %caller.caller_id, "observer disconnected");
}
