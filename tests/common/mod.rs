// Shared test helpers
#![allow(dead_code)]

use livetraffic::channel::{Connector, TrafficChannel};
use livetraffic::error::ChannelError;
use livetraffic::render::ChartSet;
use livetraffic::session::SessionContext;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

pub const TEST_TOKEN: &str = "test-token";

pub const TEST_CONFIG: &str = r#"
[server]
port = 8090
host = "127.0.0.1"

[backend]
base_url = "https://nms.example.net"

[session]
token = "test-token"

[stream]
window_size = 30

[monitoring]
stats_log_interval_secs = 60
"#;

pub fn session() -> SessionContext {
    SessionContext::new(TEST_TOKEN).unwrap()
}

pub fn interfaces_list(names: &[&str]) -> String {
    serde_json::json!({ "type": "interfaces_list", "data": names }).to_string()
}

pub fn traffic_update(entries: &[(&str, f64, f64)]) -> String {
    let data: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(name, rx, tx)| {
            (
                name.to_string(),
                serde_json::json!({ "rx_bps": rx, "tx_bps": tx }),
            )
        })
        .collect();
    serde_json::json!({ "type": "traffic_update", "data": data }).to_string()
}

#[derive(Default)]
struct MockState {
    senders: Vec<(String, mpsc::Sender<String>)>,
    /// One entry per connect attempt: (device id, every earlier channel already closed).
    opens: Vec<(String, bool)>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
}

/// In-memory connector: each connect hands back a channel whose feeding
/// sender stays with the test.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect attempts for `device_id` fail with HTTP 403.
    pub fn fail_for(&self, device_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(device_id.to_string());
    }

    /// Connect attempts for `device_id` never resolve.
    pub fn hang_for(&self, device_id: &str) {
        self.state
            .lock()
            .unwrap()
            .hanging
            .insert(device_id.to_string());
    }

    /// Sender feeding the most recent channel opened for `device_id`.
    pub fn sender(&self, device_id: &str) -> Option<mpsc::Sender<String>> {
        self.state
            .lock()
            .unwrap()
            .senders
            .iter()
            .rev()
            .find(|(id, _)| id == device_id)
            .map(|(_, tx)| tx.clone())
    }

    /// Drop the connector's own senders for `device_id`, so the channel ends
    /// once the test drops its clones too.
    pub fn hang_up(&self, device_id: &str) {
        self.state
            .lock()
            .unwrap()
            .senders
            .retain(|(id, _)| id != device_id);
    }

    pub fn opens(&self) -> Vec<(String, bool)> {
        self.state.lock().unwrap().opens.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().opens.len()
    }

    pub fn all_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .senders
            .iter()
            .all(|(_, tx)| tx.is_closed())
    }
}

impl Connector for MockConnector {
    async fn connect(
        &self,
        device_id: &str,
        _session: &SessionContext,
    ) -> Result<TrafficChannel, ChannelError> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            let prev_closed = state.senders.iter().all(|(_, tx)| tx.is_closed());
            state.opens.push((device_id.to_string(), prev_closed));
            state.hanging.contains(device_id)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(device_id) {
            return Err(ChannelError::Rejected { status: 403 });
        }
        let (tx, rx) = mpsc::channel(64);
        state.senders.push((device_id.to_string(), tx));
        Ok(TrafficChannel::new(device_id, rx))
    }
}

/// Wait until the published chart set satisfies `pred`.
pub async fn wait_for<F>(rx: &mut watch::Receiver<ChartSet>, pred: F) -> ChartSet
where
    F: Fn(&ChartSet) -> bool,
{
    tokio::time::timeout(std::time::Duration::from_secs(3), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if pred(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("chart publisher dropped");
        }
    })
    .await
    .expect("timed out waiting for chart state")
}

/// Serve `router` on an ephemeral local port, returning its base url.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}
