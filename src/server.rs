use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::engine::SitePredictionEngine;

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SitePredictionEngine>,
}

pub fn router(engine: Arc<SitePredictionEngine>) -> Router {
    Router::new()
        .route("/enrich", post(enrich))
        .route("/stream", get(stream))
        .route("/health", get(health))
        .route("/vehicles/:vin/distances", delete(reset_distances))
        .with_state(AppState { engine })
}

// ---------- Handlers ----------

async fn enrich(State(state): State<AppState>, Json(report): Json<Value>) -> Json<Value> {
    Json(state.engine.enrich_message(report))
}

async fn stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut tx, mut rx) = socket.split();

    while let Some(msg) = rx.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("stream read error: {}", e);
                break;
            }
        };

        // frames that are not JSON at all are forwarded as they came
        let out = match serde_json::from_str::<Value>(&text) {
            Ok(report) => {
                let enriched = state.engine.enrich_message(report);
                match serde_json::to_string(&enriched) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!("failed to encode enriched report: {}", e);
                        text
                    }
                }
            }
            Err(e) => {
                tracing::warn!("report frame is not JSON, forwarding unchanged: {}", e);
                text
            }
        };
        if tx.send(Message::Text(out)).await.is_err() {
            break;
        }
    }
    tracing::debug!("stream closed");
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let generation = state.engine.store().current();
    Json(json!({
        "status": "ok",
        "generation": generation.number,
        "vehicles": generation.model.len(),
        "tracked_vehicles": generation.tracker.vehicle_count(),
    }))
}

async fn reset_distances(State(state): State<AppState>, Path(vin): Path<String>) -> StatusCode {
    if state.engine.reset_vehicle(&vin) {
        tracing::info!("reset distance state for {}", vin);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
