use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::document::DocumentStore;
use crate::error::Result;

/// Durable guild → last-reminder timestamp mapping (`reminder_log.json`).
///
/// An absent entry means the guild has never been reminded. Entries are
/// written one at a time, immediately after a successful send, so a crash
/// mid-sweep cannot produce duplicate same-day reminders for guilds already
/// processed.
pub struct ReminderLog {
    store: Mutex<Box<dyn DocumentStore>>,
}

impl ReminderLog {
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub fn snapshot(&self) -> Result<BTreeMap<String, DateTime<Utc>>> {
        let store = self.store.lock().unwrap();
        load_map(store.as_ref())
    }

    /// Record that `server_id` was reminded at `when`, persisting at once.
    pub fn mark_reminded(&self, server_id: &str, when: DateTime<Utc>) -> Result<()> {
        let store = self.store.lock().unwrap();
        let mut map = load_map(store.as_ref())?;
        map.insert(server_id.to_string(), when);
        store.save(&serde_json::to_string_pretty(&map)?)
    }
}

fn load_map(store: &dyn DocumentStore) -> Result<BTreeMap<String, DateTime<Utc>>> {
    match store.load()? {
        Some(contents) => Ok(serde_json::from_str(&contents)?),
        None => Ok(BTreeMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{JsonFileStore, MemoryStore};
    use chrono::TimeZone;

    #[test]
    fn absent_document_means_never_reminded() {
        let log = ReminderLog::new(Box::new(MemoryStore::new()));
        assert!(log.snapshot().unwrap().is_empty());
    }

    #[test]
    fn mark_reminded_persists_immediately() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reminder_log.json");
        let when = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();

        let log = ReminderLog::new(Box::new(JsonFileStore::new(&path)));
        log.mark_reminded("42", when).unwrap();

        // A fresh handle over the same file sees the entry at once.
        let reopened = ReminderLog::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reopened.snapshot().unwrap().get("42"), Some(&when));
    }

    #[test]
    fn timestamps_round_trip_as_rfc3339_strings() {
        let log = ReminderLog::new(Box::new(MemoryStore::new()));
        let when = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        log.mark_reminded("42", when).unwrap();

        let doc = serde_json::to_string(&log.snapshot().unwrap()).unwrap();
        assert!(doc.contains("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn remark_overwrites_the_previous_timestamp() {
        let log = ReminderLog::new(Box::new(MemoryStore::new()));
        let first = Utc.with_ymd_and_hms(2023, 11, 13, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2023, 11, 14, 8, 0, 0).unwrap();

        log.mark_reminded("42", first).unwrap();
        log.mark_reminded("42", second).unwrap();

        let map = log.snapshot().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["42"], second);
    }
}
