// Inbound traffic channel messages

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MessageError;

pub const INTERFACES_LIST: &str = "interfaces_list";
pub const TRAFFIC_UPDATE: &str = "traffic_update";

/// Receive/transmit rates for one interface, in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRates {
    pub rx_bps: f64,
    pub tx_bps: f64,
}

/// A decoded notification from the traffic channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TrafficMessage {
    /// Interface names announced for the device, in announcement order.
    InterfacesList(Vec<String>),
    /// Rates keyed by interface name. Entries that failed to parse are
    /// counted in `skipped` and left out.
    TrafficUpdate {
        rates: Vec<(String, InterfaceRates)>,
        skipped: usize,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl TrafficMessage {
    /// Decode one text frame: `{ "type": ..., "data": ... }`.
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        match envelope.kind.as_str() {
            INTERFACES_LIST => {
                let names: Vec<String> =
                    serde_json::from_value(envelope.data).map_err(|source| {
                        MessageError::InvalidData {
                            kind: envelope.kind.clone(),
                            source,
                        }
                    })?;
                Ok(TrafficMessage::InterfacesList(names))
            }
            TRAFFIC_UPDATE => {
                let entries: serde_json::Map<String, Value> =
                    serde_json::from_value(envelope.data).map_err(|source| {
                        MessageError::InvalidData {
                            kind: envelope.kind.clone(),
                            source,
                        }
                    })?;
                let mut rates = Vec::with_capacity(entries.len());
                let mut skipped = 0;
                for (name, value) in entries {
                    match serde_json::from_value::<InterfaceRates>(value) {
                        Ok(r) => rates.push((name, r)),
                        Err(_) => skipped += 1,
                    }
                }
                Ok(TrafficMessage::TrafficUpdate { rates, skipped })
            }
            _ => Err(MessageError::UnknownType(envelope.kind)),
        }
    }
}
