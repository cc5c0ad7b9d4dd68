// HTTP request handlers
use crate::domain::sample::MotorSample;
use crate::domain::session::{Ack, SessionConfig};
use crate::infrastructure::event_stream::stream_from_subscription;
use crate::presentation::app_state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SessionConfig>,
) -> Json<Ack> {
    Json(state.motor_service.start(config))
}

pub async fn push_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<MotorSample>,
) -> Json<Ack> {
    Json(state.motor_service.submit(sample))
}

pub async fn end_session(State(state): State<Arc<AppState>>) -> Json<Ack> {
    Json(state.motor_service.end())
}

/// Live session events as newline-delimited JSON
pub async fn stream_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_subscription(state.events.subscribe())
}
