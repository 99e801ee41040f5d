use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use pepito_discord::DiscordAdapter;
use pepito_store::{ChannelDirectory, JsonFileStore, ReminderLog};
use pepito_stream::StreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // load config: explicit path via PEPITO_CONFIG env > ./pepito.toml
    let config_path = std::env::var("PEPITO_CONFIG").ok();
    let config =
        pepito_core::config::PepitoConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            pepito_core::config::PepitoConfig::default()
        });

    let directory = Arc::new(ChannelDirectory::new(Box::new(JsonFileStore::new(
        &config.storage.channels_path,
    ))));
    let ledger = Arc::new(ReminderLog::new(Box::new(JsonFileStore::new(
        &config.storage.reminder_log_path,
    ))));

    // Payload channel: StreamClient → dispatcher (spawned by the adapter).
    let (events_tx, events_rx) = mpsc::channel(256);
    // Shutdown signal for the ingest loop and the reminder sweep.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let stream = StreamClient::new(
        config.stream.url.clone(),
        Duration::from_secs(config.stream.retry_secs),
    );
    tokio::spawn(stream.run(events_tx, shutdown_rx.clone()));
    info!(url = %config.stream.url, "stream ingestion started");

    let adapter = DiscordAdapter::new(&config.discord, directory, ledger);
    tokio::select! {
        result = adapter.run(events_rx, shutdown_rx) => {
            if let Err(e) = result {
                error!("Discord adapter failed: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    let _ = shutdown_tx.send(true);
    Ok(())
}
