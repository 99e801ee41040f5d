use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::DocumentStore;
use crate::error::Result;

/// One registered guild.
///
/// `channel_id` absent means the guild is unconfigured: it receives no
/// notifications, but is eligible for configuration reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Display name cached at last observation; may go stale.
    pub server_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Durable guild → destination mapping (`channels.json`).
///
/// Every method is one atomic load-mutate-save; the mutex is never held
/// across an await point. Concurrent writers are last-write-wins.
pub struct ChannelDirectory {
    store: Mutex<Box<dyn DocumentStore>>,
}

impl ChannelDirectory {
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Current view of every registered guild.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Destination>> {
        let store = self.store.lock().unwrap();
        load_map(store.as_ref())
    }

    /// Make sure `server_id` has an entry, refreshing the cached name.
    /// New entries start unconfigured.
    pub fn ensure(&self, server_id: &str, server_name: &str) -> Result<()> {
        let store = self.store.lock().unwrap();
        let mut map = load_map(store.as_ref())?;
        match map.get_mut(server_id) {
            Some(dest) if dest.server_name == server_name => return Ok(()),
            Some(dest) => dest.server_name = server_name.to_string(),
            None => {
                debug!(server_id, server = server_name, "registering new guild");
                map.insert(
                    server_id.to_string(),
                    Destination {
                        server_name: server_name.to_string(),
                        channel_id: None,
                    },
                );
            }
        }
        save_map(store.as_ref(), &map)
    }

    /// Configure (or reconfigure) the delivery channel for a guild.
    /// Idempotent; the latest configuration wins.
    pub fn set_channel(&self, server_id: &str, server_name: &str, channel_id: &str) -> Result<()> {
        let store = self.store.lock().unwrap();
        let mut map = load_map(store.as_ref())?;
        map.insert(
            server_id.to_string(),
            Destination {
                server_name: server_name.to_string(),
                channel_id: Some(channel_id.to_string()),
            },
        );
        save_map(store.as_ref(), &map)
    }

    /// Drop a guild entirely (the bot left or was removed).
    /// Returns whether an entry existed.
    pub fn remove(&self, server_id: &str) -> Result<bool> {
        let store = self.store.lock().unwrap();
        let mut map = load_map(store.as_ref())?;
        if map.remove(server_id).is_none() {
            return Ok(false);
        }
        save_map(store.as_ref(), &map)?;
        Ok(true)
    }
}

fn load_map(store: &dyn DocumentStore) -> Result<BTreeMap<String, Destination>> {
    match store.load()? {
        Some(contents) => Ok(serde_json::from_str(&contents)?),
        None => Ok(BTreeMap::new()),
    }
}

fn save_map(store: &dyn DocumentStore, map: &BTreeMap<String, Destination>) -> Result<()> {
    // Pretty output with non-ASCII preserved, matching the on-disk format
    // the original documents used.
    store.save(&serde_json::to_string_pretty(map)?)
}
