use anyhow::Result;
use livetraffic::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let session = session::SessionContext::from_config(&app_config.session)?;

    let connector = channel::WsConnector::from_config(&app_config.backend, &app_config.stream)?;
    let devices = Arc::new(devices::DeviceClient::from_config(&app_config.backend)?);
    let view = view::TrafficView::new(connector, session.clone(), app_config.stream.window_size);

    let (charts_tx, charts_rx) = watch::channel(render::ChartSet::default());
    let (commands_tx, commands_rx) = worker::command_channel();
    let chart_clients = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            view,
            commands_rx,
            charts_tx,
            chart_clients: chart_clients.clone(),
            shutdown_rx,
        },
        worker::WorkerConfig {
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
            initial_device: app_config.stream.device_id.clone(),
        },
    );

    let app = routes::app(commands_tx, charts_rx, devices, session, chart_clients);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        backend = %app_config.backend.base_url,
        window_size = app_config.stream.window_size,
        "Listening on http://{}",
        addr
    );

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            match worker_handle.await {
                Ok(stats) => tracing::info!(
                    channels_opened = stats.channels_opened,
                    messages_applied = stats.messages_applied,
                    messages_dropped = stats.messages_dropped,
                    "stream worker stopped"
                ),
                Err(e) => tracing::warn!(error = %e, "stream worker task failed"),
            }
        }
    }

    Ok(())
}
