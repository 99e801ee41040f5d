use std::sync::Arc;

use tracing::{debug, error, info, warn};

use pepito_core::DoorEvent;
use pepito_store::ChannelDirectory;

use crate::gateway::{ChatGateway, Notification};

/// Delivers one door event to every configured destination.
///
/// Read-only over the directory; a snapshot is taken per delivery and
/// destinations configured mid-pass simply catch the next event.
pub struct FanoutEngine<G> {
    directory: Arc<ChannelDirectory>,
    gateway: Arc<G>,
}

impl<G: ChatGateway> FanoutEngine<G> {
    pub fn new(directory: Arc<ChannelDirectory>, gateway: Arc<G>) -> Self {
        Self { directory, gateway }
    }

    /// Best-effort fan-out: the event is rendered once, then sent to each
    /// configured destination independently. Failures are collected and
    /// logged; one bad destination never blocks the rest. Fire-and-forget:
    /// there is no caller to report back to.
    pub async fn deliver(&self, event: &DoorEvent) {
        let note = Notification {
            title: event.title(),
            image_url: event.image_url.clone(),
        };

        let snapshot = match self.directory.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "channel directory unreadable, delivery aborted");
                return;
            }
        };

        let mut sent = 0usize;
        let mut failed = 0usize;
        for (server_id, dest) in &snapshot {
            let Some(channel_id) = dest.channel_id.as_deref() else {
                debug!(%server_id, server = %dest.server_name, "skipping unconfigured guild");
                continue;
            };
            match self.gateway.send_notification(channel_id, &note).await {
                Ok(()) => {
                    debug!(%server_id, channel_id, "notification delivered");
                    sent += 1;
                }
                Err(e) => {
                    warn!(
                        %server_id,
                        server = %dest.server_name,
                        channel_id,
                        error = %e,
                        "notification delivery failed"
                    );
                    failed += 1;
                }
            }
        }

        info!(kind = %event.kind, sent, failed, "door event fanned out");
    }
}
