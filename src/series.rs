// Fixed-capacity rolling windows of interface samples.
// A full series evicts its oldest sample before appending the new one.

use std::collections::{HashMap, VecDeque};

use crate::models::InterfaceRates;

/// Default number of samples kept per interface.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// One observation for one interface.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: String,
    pub rx_bps: f64,
    pub tx_bps: f64,
}

#[derive(Debug, Clone)]
pub struct InterfaceSeries {
    capacity: usize,
    labels: VecDeque<String>,
    rx_bps: VecDeque<f64>,
    tx_bps: VecDeque<f64>,
}

impl InterfaceSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            labels: VecDeque::with_capacity(capacity),
            rx_bps: VecDeque::with_capacity(capacity),
            tx_bps: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, returning the evicted one if the window was full.
    pub fn push(&mut self, label: impl Into<String>, rx_bps: f64, tx_bps: f64) -> Option<Sample> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.labels.len() >= self.capacity {
            match (
                self.labels.pop_front(),
                self.rx_bps.pop_front(),
                self.tx_bps.pop_front(),
            ) {
                (Some(label), Some(rx_bps), Some(tx_bps)) => Some(Sample {
                    label,
                    rx_bps,
                    tx_bps,
                }),
                _ => None,
            }
        } else {
            None
        };
        self.labels.push_back(label.into());
        self.rx_bps.push_back(rx_bps);
        self.tx_bps.push_back(tx_bps);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &VecDeque<String> {
        &self.labels
    }

    pub fn rx_bps(&self) -> &VecDeque<f64> {
        &self.rx_bps
    }

    pub fn tx_bps(&self) -> &VecDeque<f64> {
        &self.tx_bps
    }

    /// Samples oldest first.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.labels
            .iter()
            .zip(self.rx_bps.iter())
            .zip(self.tx_bps.iter())
            .map(|((label, rx), tx)| Sample {
                label: label.clone(),
                rx_bps: *rx,
                tx_bps: *tx,
            })
    }

    pub fn latest(&self) -> Option<Sample> {
        Some(Sample {
            label: self.labels.back()?.clone(),
            rx_bps: *self.rx_bps.back()?,
            tx_bps: *self.tx_bps.back()?,
        })
    }
}

/// Series for every announced interface of one device, in announcement order.
#[derive(Debug, Clone)]
pub struct SeriesSet {
    window: usize,
    order: Vec<String>,
    series: HashMap<String, InterfaceSeries>,
}

impl SeriesSet {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            order: Vec::new(),
            series: HashMap::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Discard all series and start one empty series per name.
    /// Repeated names keep their first position.
    pub fn reset<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clear();
        for name in names {
            let name = name.into();
            if self.series.contains_key(&name) {
                continue;
            }
            self.series
                .insert(name.clone(), InterfaceSeries::new(self.window));
            self.order.push(name);
        }
    }

    /// Append one sample per known interface in `rates`. Unknown names are
    /// ignored. Returns the number of samples appended.
    pub fn apply_rates<'a, I>(&mut self, label: &str, rates: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a InterfaceRates)>,
    {
        let mut applied = 0;
        for (name, r) in rates {
            if let Some(series) = self.series.get_mut(name) {
                series.push(label, r.rx_bps, r.tx_bps);
                applied += 1;
            }
        }
        applied
    }

    pub fn get(&self, name: &str) -> Option<&InterfaceSeries> {
        self.series.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InterfaceSeries)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.series.get(name).map(|s| (name.as_str(), s)))
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.series.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
