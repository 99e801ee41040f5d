//! `pepito-store` — durable guild/channel state behind a whole-document store.
//!
//! # Overview
//!
//! Two independent JSON documents back the relay:
//!
//! | Document            | Keyed by | Holds                                       |
//! |---------------------|----------|---------------------------------------------|
//! | `channels.json`     | guild id | display name + optional delivery channel id |
//! | `reminder_log.json` | guild id | UTC timestamp of the last reminder sent     |
//!
//! Every access is a single atomic read-modify-write of the whole document.
//! Saves go through a temp file and a rename so a crash mid-write never
//! leaves a torn document. Racing writers are last-write-wins.

pub mod directory;
pub mod document;
pub mod error;
pub mod ledger;

pub use directory::{ChannelDirectory, Destination};
pub use document::{DocumentStore, JsonFileStore, MemoryStore};
pub use error::{Result, StoreError};
pub use ledger::ReminderLog;
