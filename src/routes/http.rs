// GET/PUT/DELETE handlers: version, devices, selection, charts

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use crate::models::deserialize_optional_id;
use crate::version::{NAME, VERSION};
use crate::worker::Command;

/// GET /version : returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct DevicesQuery {
    vendor: Option<String>,
}

/// GET /api/devices : device list from the management API, filtered by vendor.
pub(super) async fn list_devices_handler(
    State(state): State<AppState>,
    Query(query): Query<DevicesQuery>,
) -> impl IntoResponse {
    match state
        .devices
        .list_devices(query.vendor.as_deref(), &state.session)
        .await
    {
        Ok(devices) => (StatusCode::OK, Json(serde_json::json!(devices))),
        Err(e) => {
            tracing::warn!(error = %e, operation = "list_devices", "device listing failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SelectionRequest {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    device_id: Option<String>,
}

/// GET /api/selection : current stream state.
pub(super) async fn get_selection_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.charts_rx.borrow().state.clone())
}

/// PUT /api/selection : queue a device selection (`null` de-selects).
pub(super) async fn put_selection_handler(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> impl IntoResponse {
    queue_selection(&state, request.device_id).await
}

/// DELETE /api/selection : de-select the device.
pub(super) async fn delete_selection_handler(State(state): State<AppState>) -> impl IntoResponse {
    queue_selection(&state, None).await
}

async fn queue_selection(
    state: &AppState,
    device_id: Option<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    let body = serde_json::json!({ "deviceId": device_id });
    match state.commands_tx.send(Command::Select(device_id)).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(body)),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "stream worker is not running" })),
        ),
    }
}

/// GET /api/charts : current chart state.
pub(super) async fn charts_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.charts_rx.borrow().clone())
}
