// WebSocket chart stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::watch;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::render::ChartSet;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the chart client count on drop (connect = +1, drop = -1).
struct ChartClientGuard(Arc<AtomicUsize>);

impl Drop for ChartClientGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_charts(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let charts_rx = state.charts_rx.clone();
    let conn_count = state.chart_clients.clone();
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_charts(socket, charts_rx, conn_count).await {
            tracing::info!("Chart stream error: {}", e);
        }
    })
}

async fn send_text(socket: &mut WebSocket, json: String) -> bool {
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    !(r.is_err() || r.unwrap_or(Ok(())).is_err())
}

/// Sends the current chart set, then a new one after every change.
async fn stream_charts(
    mut socket: WebSocket,
    mut charts_rx: watch::Receiver<ChartSet>,
    conn_count: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = ChartClientGuard(conn_count);
    tracing::info!("Client connected to chart stream");

    let json = serde_json::to_string(&*charts_rx.borrow_and_update())?;
    if !send_text(&mut socket, json).await {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            changed = charts_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let json = serde_json::to_string(&*charts_rx.borrow_and_update())?;
                if !send_text(&mut socket, json).await {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from chart stream");
    Ok(())
}
