// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{mpsc, watch};
use tower_http::cors::{Any, CorsLayer};

use crate::devices::DeviceClient;
use crate::render::ChartSet;
use crate::session::SessionContext;
use crate::worker::Command;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) commands_tx: mpsc::Sender<Command>,
    pub(crate) charts_rx: watch::Receiver<ChartSet>,
    pub(crate) devices: Arc<DeviceClient>,
    pub(crate) session: SessionContext,
    pub(crate) chart_clients: Arc<AtomicUsize>,
}

pub fn app(
    commands_tx: mpsc::Sender<Command>,
    charts_rx: watch::Receiver<ChartSet>,
    devices: Arc<DeviceClient>,
    session: SessionContext,
    chart_clients: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        commands_tx,
        charts_rx,
        devices,
        session,
        chart_clients,
    };
    Router::new()
        .route("/", get(|| async { "livetraffic: live interface traffic" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/devices", get(http::list_devices_handler)) // GET /api/devices
        .route(
            "/api/selection",
            get(http::get_selection_handler)
                .put(http::put_selection_handler)
                .delete(http::delete_selection_handler),
        ) // GET/PUT/DELETE /api/selection
        .route("/api/charts", get(http::charts_handler)) // GET /api/charts
        .route("/ws/charts", get(ws::ws_charts)) // WS /ws/charts
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
