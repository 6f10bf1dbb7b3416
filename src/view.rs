// Live traffic stream view: at most one open channel plus the series it feeds.
// The previous channel is always released before a new one is opened.

use crate::channel::{Connector, TrafficChannel};
use crate::error::{ChannelError, MessageError};
use crate::models::TrafficMessage;
use crate::render::{ChartSet, StreamState};
use crate::series::SeriesSet;
use crate::session::SessionContext;

/// Counters reported in the periodic stats log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewStats {
    pub channels_opened: u64,
    pub messages_applied: u64,
    pub messages_dropped: u64,
    pub samples_appended: u64,
    /// Rate entries for interfaces that were never announced.
    pub unknown_interfaces: u64,
}

pub struct TrafficView<C> {
    connector: C,
    session: SessionContext,
    series: SeriesSet,
    channel: Option<TrafficChannel>,
    state: StreamState,
    stats: ViewStats,
}

/// Wall-clock label for a sample.
pub fn now_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

impl<C: Connector> TrafficView<C> {
    pub fn new(connector: C, session: SessionContext, window_size: usize) -> Self {
        Self {
            connector,
            session,
            series: SeriesSet::new(window_size),
            channel: None,
            state: StreamState::Idle,
            stats: ViewStats::default(),
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    pub fn stats(&self) -> ViewStats {
        self.stats
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Select a device, or de-select with `None` (an empty id also de-selects).
    ///
    /// Re-selecting the device whose channel is open is a no-op. Otherwise
    /// the current channel is closed and the series discarded before the new
    /// channel is opened. On failure the view is left `Closed` for that
    /// device and does not retry.
    pub async fn select(&mut self, device_id: Option<&str>) -> Result<(), ChannelError> {
        let Some(target) = self.begin_select(device_id) else {
            return Ok(());
        };
        let result = self.connector.connect(&target, &self.session).await;
        self.finish_select(&target, result)
    }

    /// First half of [`select`](Self::select): releases the current channel
    /// and returns the device that still needs a channel opened, if any.
    /// The view stays `Closed` for that device until
    /// [`finish_select`](Self::finish_select) is called. Dropping the
    /// pending open instead leaves it there.
    pub fn begin_select(&mut self, device_id: Option<&str>) -> Option<String> {
        let Some(device_id) = device_id.filter(|id| !id.is_empty()) else {
            self.release();
            self.series.clear();
            if self.state != StreamState::Idle {
                tracing::info!("device de-selected");
            }
            self.state = StreamState::Idle;
            return None;
        };

        if self
            .channel
            .as_ref()
            .is_some_and(|c| c.device_id() == device_id)
        {
            return None;
        }

        self.release();
        self.series.clear();
        self.state = StreamState::Closed {
            device_id: device_id.to_string(),
        };
        Some(device_id.to_string())
    }

    /// Second half of [`select`](Self::select): installs the opened channel.
    /// A channel for a device other than the pending one is closed unused.
    pub fn finish_select(
        &mut self,
        device_id: &str,
        result: Result<TrafficChannel, ChannelError>,
    ) -> Result<(), ChannelError> {
        let pending = self.channel.is_none() && self.state.device_id() == Some(device_id);
        match result {
            Ok(channel) if pending => {
                self.channel = Some(channel);
                self.stats.channels_opened += 1;
                self.state = StreamState::Open {
                    device_id: device_id.to_string(),
                };
                Ok(())
            }
            Ok(channel) => {
                tracing::debug!(device_id, "discarding channel for a superseded selection");
                channel.close();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    device_id,
                    error = %e,
                    operation = "open_channel",
                    "traffic channel failed to open"
                );
                Err(e)
            }
        }
    }

    /// Close the open channel, keeping the last-known series for display.
    pub fn close(&mut self) {
        if self.channel.is_none() {
            return;
        }
        self.release();
        if let Some(device_id) = self.state.device_id() {
            self.state = StreamState::Closed {
                device_id: device_id.to_string(),
            };
        }
    }

    fn release(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }

    /// Next inbound frame from the open channel.
    ///
    /// Returns `None` immediately when no channel is open, and `None` when
    /// the channel ends, in which case the view moves to `Closed`.
    /// Cancel-safe.
    pub async fn next_message(&mut self) -> Option<String> {
        let channel = self.channel.as_mut()?;
        match channel.recv().await {
            Some(text) => Some(text),
            None => {
                tracing::info!(device_id = ?self.state.device_id(), "traffic channel ended");
                self.close();
                None
            }
        }
    }

    /// Decode and apply one inbound frame with the current wall-clock label.
    /// Frames that fail to decode are dropped; the channel stays open.
    pub fn handle_text(&mut self, text: &str) -> Result<bool, MessageError> {
        match TrafficMessage::decode(text) {
            Ok(message) => Ok(self.apply(message, &now_label())),
            Err(e) => {
                self.stats.messages_dropped += 1;
                tracing::warn!(
                    device_id = ?self.state.device_id(),
                    error = %e,
                    "dropping traffic message"
                );
                Err(e)
            }
        }
    }

    /// Apply a decoded message. Returns whether anything changed.
    /// Ignored when no channel is open.
    pub fn apply(&mut self, message: TrafficMessage, label: &str) -> bool {
        if self.channel.is_none() {
            return false;
        }
        self.stats.messages_applied += 1;
        match message {
            TrafficMessage::InterfacesList(names) => {
                self.series.reset(names);
                if let Some(device_id) = self.state.device_id() {
                    tracing::debug!(
                        device_id,
                        interfaces = self.series.len(),
                        "interface list received"
                    );
                    self.state = StreamState::Streaming {
                        device_id: device_id.to_string(),
                    };
                }
                true
            }
            TrafficMessage::TrafficUpdate { rates, skipped } => {
                let applied = self
                    .series
                    .apply_rates(label, rates.iter().map(|(name, r)| (name.as_str(), r)));
                let unknown = rates.len() - applied;
                self.stats.samples_appended += applied as u64;
                self.stats.unknown_interfaces += unknown as u64;
                if unknown > 0 || skipped > 0 {
                    tracing::debug!(unknown, skipped, "traffic update entries ignored");
                }
                applied > 0
            }
        }
    }

    pub fn render(&self) -> ChartSet {
        ChartSet::build(&self.state, &self.series)
    }
}
