use async_trait::async_trait;

use crate::error::DeliveryError;

/// A server the bot is currently a member of, as reported by the gateway.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// One rendered door-event notification: rendering happens once per event,
/// delivery once per destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub image_url: String,
}

/// The narrow interface the relay needs from the chat platform.
///
/// Sends are async (network); membership and permission queries read the
/// gateway's live cache and are synchronous.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Deliver a rendered notification to a channel.
    async fn send_notification(
        &self,
        channel_id: &str,
        note: &Notification,
    ) -> Result<(), DeliveryError>;

    /// Send a configuration reminder addressed to the server's owner.
    async fn send_reminder(
        &self,
        channel_id: &str,
        server: &ServerInfo,
    ) -> Result<(), DeliveryError>;

    /// Servers the bot is currently joined to.
    fn joined_servers(&self) -> Vec<ServerInfo>;

    /// Text channels of a server, in the host's enumeration order.
    fn channels_in(&self, server_id: &str) -> Vec<String>;

    /// Whether the bot may send messages in the given channel.
    fn can_send_in(&self, server_id: &str, channel_id: &str) -> bool;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Scriptable gateway double shared by the fan-out and sweep tests.
    #[derive(Default)]
    pub struct MockGateway {
        servers: Mutex<Vec<ServerInfo>>,
        channels: Mutex<HashMap<String, Vec<String>>>,
        no_send: Mutex<HashSet<String>>,
        failing: Mutex<HashSet<String>>,
        sent_notifications: Mutex<Vec<(String, Notification)>>,
        sent_reminders: Mutex<Vec<(String, String)>>,
    }

    impl MockGateway {
        pub fn add_server(&self, id: &str, name: &str, owner_id: &str, channels: &[&str]) {
            self.servers.lock().unwrap().push(ServerInfo {
                id: id.to_string(),
                name: name.to_string(),
                owner_id: owner_id.to_string(),
            });
            self.channels.lock().unwrap().insert(
                id.to_string(),
                channels.iter().map(|c| c.to_string()).collect(),
            );
        }

        /// Make every send to `channel_id` fail.
        pub fn fail_channel(&self, channel_id: &str) {
            self.failing.lock().unwrap().insert(channel_id.to_string());
        }

        /// Revoke send permission in `channel_id`.
        pub fn deny_send(&self, channel_id: &str) {
            self.no_send.lock().unwrap().insert(channel_id.to_string());
        }

        pub fn notifications(&self) -> Vec<(String, Notification)> {
            self.sent_notifications.lock().unwrap().clone()
        }

        /// `(channel_id, server_id)` pairs of delivered reminders.
        pub fn reminders(&self) -> Vec<(String, String)> {
            self.sent_reminders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatGateway for MockGateway {
        async fn send_notification(
            &self,
            channel_id: &str,
            note: &Notification,
        ) -> Result<(), DeliveryError> {
            if self.failing.lock().unwrap().contains(channel_id) {
                return Err(DeliveryError::ChannelNotFound {
                    channel_id: channel_id.to_string(),
                });
            }
            self.sent_notifications
                .lock()
                .unwrap()
                .push((channel_id.to_string(), note.clone()));
            Ok(())
        }

        async fn send_reminder(
            &self,
            channel_id: &str,
            server: &ServerInfo,
        ) -> Result<(), DeliveryError> {
            if self.failing.lock().unwrap().contains(channel_id) {
                return Err(DeliveryError::Send {
                    channel_id: channel_id.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            self.sent_reminders
                .lock()
                .unwrap()
                .push((channel_id.to_string(), server.id.clone()));
            Ok(())
        }

        fn joined_servers(&self) -> Vec<ServerInfo> {
            self.servers.lock().unwrap().clone()
        }

        fn channels_in(&self, server_id: &str) -> Vec<String> {
            self.channels
                .lock()
                .unwrap()
                .get(server_id)
                .cloned()
                .unwrap_or_default()
        }

        fn can_send_in(&self, _server_id: &str, channel_id: &str) -> bool {
            !self.no_send.lock().unwrap().contains(channel_id)
        }
    }
}
