// Per-device traffic channel: owned handle, Connector seam, WebSocket connector.
// Closing or dropping the handle drops its inbound queue and tells the reader
// task to send a close frame, so no frame after the close is delivered.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::tungstenite::{self, Message};
use url::Url;

use crate::config::{BackendConfig, StreamConfig};
use crate::error::ChannelError;
use crate::session::SessionContext;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Opens traffic channels for devices.
pub trait Connector: Send + Sync + 'static {
    fn connect(
        &self,
        device_id: &str,
        session: &SessionContext,
    ) -> impl Future<Output = Result<TrafficChannel, ChannelError>> + Send;
}

/// Owned handle to one open traffic channel.
#[derive(Debug)]
pub struct TrafficChannel {
    device_id: String,
    inbound: mpsc::Receiver<String>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TrafficChannel {
    /// Channel fed by `inbound`. Used directly by in-process connectors.
    pub fn new(device_id: impl Into<String>, inbound: mpsc::Receiver<String>) -> Self {
        Self {
            device_id: device_id.into(),
            inbound,
            shutdown: None,
        }
    }

    fn with_shutdown(mut self, shutdown: oneshot::Sender<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Next inbound text frame; `None` once the channel has ended.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Close the channel. Takes effect immediately: no further frames are
    /// delivered, and the reader sends a close frame in the background.
    pub fn close(self) {
        tracing::debug!(device_id = %self.device_id, "closing traffic channel");
    }

    fn shutdown_now(&mut self) {
        self.inbound.close();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TrafficChannel {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}

/// Channel address: `<ws|wss>://<host>/ws/traffic/<device-id>?token=<token>`.
pub fn channel_url(base_url: &Url, device_id: &str, token: &str) -> Result<Url, ChannelError> {
    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ChannelError::InvalidBaseUrl(format!(
                "unsupported scheme {other}"
            )));
        }
    };
    let mut url = base_url.clone();
    url.set_scheme(scheme)
        .map_err(|_| ChannelError::InvalidBaseUrl(base_url.to_string()))?;
    url.set_fragment(None);
    url.set_query(None);
    url.set_path("");
    url.path_segments_mut()
        .map_err(|_| ChannelError::InvalidBaseUrl(base_url.to_string()))?
        .clear()
        .extend(["ws", "traffic", device_id]);
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// Opens traffic channels over WebSockets.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: Url,
    open_timeout: Duration,
    inbound_capacity: usize,
}

impl WsConnector {
    pub fn new(
        base_url: &str,
        open_timeout: Duration,
        inbound_capacity: usize,
    ) -> Result<Self, ChannelError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ChannelError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            base_url,
            open_timeout,
            inbound_capacity: inbound_capacity.max(1),
        })
    }

    pub fn from_config(backend: &BackendConfig, stream: &StreamConfig) -> Result<Self, ChannelError> {
        Self::new(
            &backend.base_url,
            Duration::from_millis(stream.open_timeout_ms),
            stream.inbound_capacity,
        )
    }
}

impl Connector for WsConnector {
    async fn connect(
        &self,
        device_id: &str,
        session: &SessionContext,
    ) -> Result<TrafficChannel, ChannelError> {
        let url = channel_url(&self.base_url, device_id, session.token())?;
        tracing::info!(device_id, host = ?url.host_str(), "opening traffic channel");

        let timeout_ms = self.open_timeout.as_millis() as u64;
        let (ws, response) =
            tokio::time::timeout(self.open_timeout, tokio_tungstenite::connect_async(url.as_str()))
                .await
                .map_err(|_| ChannelError::Timeout(timeout_ms))?
                .map_err(|e| match e {
                    tungstenite::Error::Http(resp) => ChannelError::Rejected {
                        status: resp.status().as_u16(),
                    },
                    other => ChannelError::Connect(other.to_string()),
                })?;
        tracing::info!(
            device_id,
            status = response.status().as_u16(),
            "traffic channel connected"
        );

        let (inbound_tx, inbound_rx) = mpsc::channel(self.inbound_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(read_frames(
            ws,
            inbound_tx,
            shutdown_rx,
            device_id.to_string(),
        ));
        Ok(TrafficChannel::new(device_id, inbound_rx).with_shutdown(shutdown_tx))
    }
}

async fn read_frames(
    mut ws: WsStream,
    inbound: mpsc::Sender<String>,
    mut shutdown: oneshot::Receiver<()>,
    device_id: String,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Err(e) = ws.close(None).await {
                    tracing::debug!(device_id = %device_id, error = %e, "close handshake failed");
                }
                break;
            }
            frame = ws.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            tracing::warn!(device_id = %device_id, "dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(device_id = %device_id, ?frame, "traffic channel closed by server");
                        break;
                    }
                    // Pings are answered by tungstenite itself.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(device_id = %device_id, error = %e, "traffic channel error");
                        break;
                    }
                    None => break,
                };
                if inbound.send(text).await.is_err() {
                    // Handle closed while a frame was pending.
                    let _ = ws.close(None).await;
                    break;
                }
            }
        }
    }
    tracing::debug!(device_id = %device_id, "traffic channel reader finished");
}
