// Renderable chart state: one line chart per interface

use serde::{Deserialize, Serialize};

use crate::series::{InterfaceSeries, SeriesSet};

pub const RX_LABEL: &str = "Download (Mbps)";
pub const TX_LABEL: &str = "Upload (Mbps)";
pub const RX_COLOR: &str = "rgb(75, 192, 192)";
pub const TX_COLOR: &str = "rgb(255, 99, 132)";

/// Lifecycle of the view's stream session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StreamState {
    /// No device selected.
    Idle,
    /// Channel established, no interface list yet.
    #[serde(rename_all = "camelCase")]
    Open { device_id: String },
    /// Interface list received; samples are being applied.
    #[serde(rename_all = "camelCase")]
    Streaming { device_id: String },
    /// Channel ended or failed to open; last-known series are kept.
    #[serde(rename_all = "camelCase")]
    Closed { device_id: String },
}

impl StreamState {
    pub fn device_id(&self) -> Option<&str> {
        match self {
            StreamState::Idle => None,
            StreamState::Open { device_id }
            | StreamState::Streaming { device_id }
            | StreamState::Closed { device_id } => Some(device_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StreamState::Idle => "idle",
            StreamState::Open { .. } => "open",
            StreamState::Streaming { .. } => "streaming",
            StreamState::Closed { .. } => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceChart {
    pub interface: String,
    pub labels: Vec<String>,
    /// Receive then transmit.
    pub datasets: Vec<Dataset>,
}

impl InterfaceChart {
    pub fn from_series(interface: &str, series: &InterfaceSeries) -> Self {
        Self {
            interface: interface.to_string(),
            labels: series.labels().iter().cloned().collect(),
            datasets: vec![
                Dataset {
                    label: RX_LABEL.into(),
                    data: series.rx_bps().iter().copied().map(bps_to_mbps).collect(),
                    border_color: RX_COLOR.into(),
                },
                Dataset {
                    label: TX_LABEL.into(),
                    data: series.tx_bps().iter().copied().map(bps_to_mbps).collect(),
                    border_color: TX_COLOR.into(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub animation: bool,
    pub maintain_aspect_ratio: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            animation: false,
            maintain_aspect_ratio: true,
        }
    }
}

/// Everything a renderer needs to draw the current view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub device_id: Option<String>,
    pub state: StreamState,
    pub charts: Vec<InterfaceChart>,
    pub options: ChartOptions,
}

impl Default for ChartSet {
    fn default() -> Self {
        Self {
            device_id: None,
            state: StreamState::Idle,
            charts: Vec::new(),
            options: ChartOptions::default(),
        }
    }
}

impl ChartSet {
    pub fn build(state: &StreamState, series: &SeriesSet) -> Self {
        let charts = match state {
            StreamState::Idle => Vec::new(),
            _ => series
                .iter()
                .map(|(name, s)| InterfaceChart::from_series(name, s))
                .collect(),
        };
        Self {
            device_id: state.device_id().map(str::to_string),
            state: state.clone(),
            charts,
            options: ChartOptions::default(),
        }
    }

    pub fn chart(&self, interface: &str) -> Option<&InterfaceChart> {
        self.charts.iter().find(|c| c.interface == interface)
    }
}

/// Bits/second to megabits/second, rounded to two decimals.
pub fn bps_to_mbps(bps: f64) -> f64 {
    (bps / 1_000_000.0 * 100.0).round() / 100.0
}
