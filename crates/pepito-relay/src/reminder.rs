use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use pepito_store::{ChannelDirectory, ReminderLog};

use crate::gateway::ChatGateway;

/// Sweep cadence, and the minimum age of a previous reminder before a guild
/// becomes eligible again.
pub const REMINDER_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// True when `last` is absent or at least a full interval before `now`.
pub fn is_reminder_due(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last {
        Some(last) => now.signed_duration_since(last) >= chrono::Duration::hours(24),
        None => true,
    }
}

/// Periodic nag for guilds that never configured a notification channel.
///
/// Fires every 24 hours; the first run waits for the gateway to be fully
/// ready so the membership cache is populated. A failed send is retried
/// implicitly on the next cycle; the ledger is only updated after a
/// successful delivery.
pub struct ReminderSweep<G> {
    directory: Arc<ChannelDirectory>,
    ledger: Arc<ReminderLog>,
    gateway: Arc<G>,
}

impl<G: ChatGateway> ReminderSweep<G> {
    pub fn new(directory: Arc<ChannelDirectory>, ledger: Arc<ReminderLog>, gateway: Arc<G>) -> Self {
        Self {
            directory,
            ledger,
            gateway,
        }
    }

    pub async fn run(self, mut ready: watch::Receiver<bool>, mut shutdown: watch::Receiver<bool>) {
        while !*ready.borrow() {
            tokio::select! {
                changed = ready.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }

        info!("reminder sweep started");
        let mut interval = tokio::time::interval(REMINDER_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => self.sweep().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reminder sweep shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One pass over the bot's current membership. Guilds known to the
    /// directory but no longer joined are not visited.
    pub async fn sweep(&self) {
        let directory = match self.directory.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "channel directory unreadable, sweep aborted");
                return;
            }
        };
        let ledger = match self.ledger.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "reminder log unreadable, sweep aborted");
                return;
            }
        };

        for server in self.gateway.joined_servers() {
            if directory
                .get(&server.id)
                .is_some_and(|d| d.channel_id.is_some())
            {
                continue;
            }
            if !is_reminder_due(ledger.get(&server.id).copied(), Utc::now()) {
                continue;
            }

            // First channel, in enumeration order, where the bot can post.
            let channel_id = self
                .gateway
                .channels_in(&server.id)
                .into_iter()
                .find(|c| self.gateway.can_send_in(&server.id, c));
            let Some(channel_id) = channel_id else {
                debug!(server_id = %server.id, server = %server.name, "no sendable channel for reminder");
                continue;
            };

            match self.gateway.send_reminder(&channel_id, &server).await {
                Ok(()) => {
                    info!(server_id = %server.id, server = %server.name, %channel_id, "reminder sent");
                    if let Err(e) = self.ledger.mark_reminded(&server.id, Utc::now()) {
                        error!(server_id = %server.id, error = %e, "failed to record reminder timestamp");
                    }
                }
                Err(e) => {
                    warn!(
                        server_id = %server.id,
                        server = %server.name,
                        %channel_id,
                        error = %e,
                        "reminder delivery failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::MockGateway;
    use pepito_store::MemoryStore;

    fn fixtures() -> (Arc<ChannelDirectory>, Arc<ReminderLog>, Arc<MockGateway>) {
        (
            Arc::new(ChannelDirectory::new(Box::new(MemoryStore::new()))),
            Arc::new(ReminderLog::new(Box::new(MemoryStore::new()))),
            Arc::new(MockGateway::default()),
        )
    }

    #[test]
    fn due_when_never_reminded_or_a_day_old() {
        let now = Utc::now();
        assert!(is_reminder_due(None, now));
        assert!(is_reminder_due(Some(now - chrono::Duration::hours(25)), now));
        assert!(is_reminder_due(Some(now - chrono::Duration::hours(24)), now));
        assert!(!is_reminder_due(Some(now - chrono::Duration::hours(23)), now));
        assert!(!is_reminder_due(Some(now), now));
    }

    #[tokio::test]
    async fn reminds_only_eligible_guilds_and_records_them() {
        let (directory, ledger, gateway) = fixtures();

        // Configured guild: never reminded.
        directory.set_channel("1", "Alpha", "101").unwrap();
        gateway.add_server("1", "Alpha", "o1", &["101"]);

        // Unconfigured but reminded an hour ago: gated.
        directory.ensure("2", "Beta").unwrap();
        ledger
            .mark_reminded("2", Utc::now() - chrono::Duration::hours(1))
            .unwrap();
        gateway.add_server("2", "Beta", "o2", &["201"]);

        // Unconfigured, reminded 25 h ago: due again.
        directory.ensure("3", "Gamma").unwrap();
        ledger
            .mark_reminded("3", Utc::now() - chrono::Duration::hours(25))
            .unwrap();
        gateway.add_server("3", "Gamma", "o3", &["301", "302"]);

        let sweep = ReminderSweep::new(
            Arc::clone(&directory),
            Arc::clone(&ledger),
            Arc::clone(&gateway),
        );
        sweep.sweep().await;

        let sent = gateway.reminders();
        assert_eq!(sent, vec![("301".to_string(), "3".to_string())]);

        let log = ledger.snapshot().unwrap();
        assert!(
            log["3"] > Utc::now() - chrono::Duration::minutes(1),
            "ledger entry refreshed after the send"
        );
        assert!(
            log["2"] < Utc::now() - chrono::Duration::minutes(30),
            "gated guild's entry untouched"
        );
    }

    #[tokio::test]
    async fn skips_channels_without_send_permission() {
        let (directory, ledger, gateway) = fixtures();
        directory.ensure("1", "Alpha").unwrap();
        gateway.add_server("1", "Alpha", "o1", &["101", "102"]);
        gateway.deny_send("101");

        let sweep = ReminderSweep::new(directory, ledger, Arc::clone(&gateway));
        sweep.sweep().await;

        assert_eq!(
            gateway.reminders(),
            vec![("102".to_string(), "1".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_send_leaves_the_ledger_untouched() {
        let (directory, ledger, gateway) = fixtures();
        directory.ensure("1", "Alpha").unwrap();
        gateway.add_server("1", "Alpha", "o1", &["101"]);
        gateway.fail_channel("101");

        let sweep = ReminderSweep::new(directory, Arc::clone(&ledger), Arc::clone(&gateway));
        sweep.sweep().await;

        assert!(gateway.reminders().is_empty());
        assert!(
            ledger.snapshot().unwrap().is_empty(),
            "retry stays implicit for the next cycle"
        );
    }

    #[tokio::test]
    async fn guild_with_no_sendable_channel_is_skipped_entirely() {
        let (directory, ledger, gateway) = fixtures();
        directory.ensure("1", "Alpha").unwrap();
        gateway.add_server("1", "Alpha", "o1", &["101"]);
        gateway.deny_send("101");

        let sweep = ReminderSweep::new(directory, Arc::clone(&ledger), Arc::clone(&gateway));
        sweep.sweep().await;

        assert!(gateway.reminders().is_empty());
        assert!(ledger.snapshot().unwrap().is_empty());
    }
}
