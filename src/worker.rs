// Stream worker: the single task that owns the traffic view.
// Selection commands and channel frames are applied one at a time, in arrival
// order; every change is published as a fresh ChartSet.

use crate::channel::{Connector, TrafficChannel};
use crate::error::ChannelError;
use crate::render::ChartSet;
use crate::view::{TrafficView, ViewStats};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, interval};

/// Pending selection commands before senders wait.
pub const COMMAND_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select a device, or de-select with `None`.
    Select(Option<String>),
}

pub fn command_channel() -> (mpsc::Sender<Command>, mpsc::Receiver<Command>) {
    mpsc::channel(COMMAND_CAPACITY)
}

/// View, channels, and shutdown for the worker.
pub struct WorkerDeps<C> {
    pub view: TrafficView<C>,
    pub commands_rx: mpsc::Receiver<Command>,
    pub charts_tx: watch::Sender<ChartSet>,
    pub chart_clients: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
    /// Device selected before the first command is read.
    pub initial_device: Option<String>,
}

/// Spawns the worker. The task ends on shutdown or once every command
/// sender is gone; the open channel is closed before it returns.
pub fn spawn<C: Connector>(
    deps: WorkerDeps<C>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<ViewStats> {
    let WorkerDeps {
        mut view,
        mut commands_rx,
        charts_tx,
        chart_clients,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        stats_log_interval_secs,
        initial_device,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    tokio::spawn(async move {
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut running = true;
        if initial_device.is_some() {
            running = run_selection(
                &mut view,
                initial_device,
                &mut commands_rx,
                &mut shutdown_rx,
                &charts_tx,
            )
            .await;
        }

        while running {
            tokio::select! {
                command = commands_rx.recv() => {
                    match command {
                        Some(Command::Select(device_id)) => {
                            running = run_selection(
                                &mut view,
                                device_id,
                                &mut commands_rx,
                                &mut shutdown_rx,
                                &charts_tx,
                            )
                            .await;
                        }
                        None => {
                            tracing::debug!("Command channel closed");
                            break;
                        }
                    }
                }
                frame = view.next_message(), if view.has_channel() => {
                    match frame {
                        Some(text) => {
                            if let Ok(true) = view.handle_text(&text) {
                                publish(&charts_tx, &view);
                            }
                        }
                        None => publish(&charts_tx, &view),
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let stats = view.stats();
                    tracing::info!(
                        state = view.state().name(),
                        device_id = ?view.state().device_id(),
                        chart_clients = chart_clients.load(std::sync::atomic::Ordering::Relaxed),
                        channels_opened = stats.channels_opened,
                        messages_applied = stats.messages_applied,
                        messages_dropped = stats.messages_dropped,
                        samples_appended = stats.samples_appended,
                        "app stats"
                    );
                }
            }
        }

        view.close();
        publish(&charts_tx, &view);
        view.stats()
    })
}

enum Opening {
    Done(Result<TrafficChannel, ChannelError>),
    Superseded(Option<String>),
    Stop,
}

/// Apply one selection. A pending open is raced against newer commands and
/// shutdown: a newer selection replaces it and shutdown abandons it.
/// Returns `false` when the worker should stop.
async fn run_selection<C: Connector>(
    view: &mut TrafficView<C>,
    mut device_id: Option<String>,
    commands_rx: &mut mpsc::Receiver<Command>,
    shutdown_rx: &mut oneshot::Receiver<()>,
    charts_tx: &watch::Sender<ChartSet>,
) -> bool {
    loop {
        let Some(target) = view.begin_select(device_id.as_deref()) else {
            publish(charts_tx, view);
            return true;
        };
        publish(charts_tx, view);

        let opening = {
            let connect = view.connector().connect(&target, view.session());
            tokio::select! {
                result = connect => Opening::Done(result),
                command = commands_rx.recv() => match command {
                    Some(Command::Select(next)) => Opening::Superseded(next),
                    None => Opening::Stop,
                },
                _ = &mut *shutdown_rx => Opening::Stop,
            }
        };

        match opening {
            Opening::Done(result) => {
                // Failure is logged by the view; the worker keeps serving commands.
                let _ = view.finish_select(&target, result);
                publish(charts_tx, view);
                return true;
            }
            Opening::Superseded(next) => {
                tracing::info!(device_id = %target, "pending channel open superseded");
                device_id = next;
            }
            Opening::Stop => {
                tracing::debug!(device_id = %target, "pending channel open abandoned");
                return false;
            }
        }
    }
}

fn publish<C: Connector>(charts_tx: &watch::Sender<ChartSet>, view: &TrafficView<C>) {
    charts_tx.send_replace(view.render());
}
