use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use pepito_core::config::DiscordConfig;
use pepito_relay::{FanoutEngine, ReminderSweep};
use pepito_store::{ChannelDirectory, ReminderLog};

use crate::error::DiscordError;
use crate::gateway::SerenityGateway;
use crate::handler::PepitoHandler;

/// Discord channel adapter.
///
/// Wraps a serenity `Client` and drives the event loop until the process
/// exits, reconnecting whenever the gateway drops. The dispatcher and the
/// reminder sweep are spawned once against the first client's REST handle
/// and cache, which stay valid across gateway reconnects.
pub struct DiscordAdapter {
    config: DiscordConfig,
    directory: Arc<ChannelDirectory>,
    ledger: Arc<ReminderLog>,
}

impl DiscordAdapter {
    pub fn new(
        config: &DiscordConfig,
        directory: Arc<ChannelDirectory>,
        ledger: Arc<ReminderLog>,
    ) -> Self {
        Self {
            config: config.clone(),
            directory,
            ledger,
        }
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Never returns once connected; runs for the lifetime of the process.
    /// `events_rx` feeds decoded stream payloads into the dispatcher;
    /// `shutdown` cancels the reminder sweep.
    pub async fn run(
        self,
        events_rx: mpsc::Receiver<Value>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), DiscordError> {
        if self.config.bot_token.is_empty() {
            return Err(DiscordError::NoToken);
        }

        let intents = GatewayIntents::GUILDS;
        let (ready_tx, ready_rx) = watch::channel(false);
        let ready_tx = Arc::new(ready_tx);

        // Build first client, retrying until it succeeds.
        let first_client = loop {
            match self.build_client(intents, &ready_tx).await {
                Ok(client) => break client,
                Err(e) => {
                    error!("Discord: initial connect failed ({e}), retrying in 30s");
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            }
        };

        let gateway = Arc::new(SerenityGateway::new(
            Arc::clone(&first_client.http),
            Arc::clone(&first_client.cache),
        ));

        let fanout = FanoutEngine::new(Arc::clone(&self.directory), Arc::clone(&gateway));
        tokio::spawn(pepito_relay::run_dispatcher(events_rx, fanout));

        let sweep = ReminderSweep::new(
            Arc::clone(&self.directory),
            Arc::clone(&self.ledger),
            gateway,
        );
        tokio::spawn(sweep.run(ready_rx, shutdown));

        let mut client = first_client;
        loop {
            info!("Discord: gateway connecting");

            if let Err(e) = client.start().await {
                warn!("Discord: gateway error ({e}), reconnecting in 5s");
            } else {
                info!("Discord: gateway stopped cleanly, reconnecting in 5s");
            }

            tokio::time::sleep(Duration::from_secs(5)).await;

            // Rebuild the client for the next attempt.
            client = loop {
                match self.build_client(intents, &ready_tx).await {
                    Ok(client) => break client,
                    Err(e) => {
                        error!("Discord: reconnect failed ({e}), retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };
        }
    }

    /// Build a fresh serenity `Client` with our event handler.
    async fn build_client(
        &self,
        intents: GatewayIntents,
        ready_tx: &Arc<watch::Sender<bool>>,
    ) -> Result<Client, serenity::Error> {
        let handler = PepitoHandler {
            directory: Arc::clone(&self.directory),
            developer_guild_id: self.config.developer_guild_id,
            ready_tx: Arc::clone(ready_tx),
        };

        Client::builder(&self.config.bot_token, intents)
            .event_handler(handler)
            .await
    }
}
