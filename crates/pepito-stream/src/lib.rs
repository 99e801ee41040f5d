//! `pepito-stream` — long-lived SSE ingestion for the cat-door event feed.
//!
//! [`StreamClient`] keeps one streaming GET open against the configured
//! endpoint, decodes the line framing into JSON payloads and forwards them
//! over an mpsc channel. Any failure (connect error, bad status, dropped
//! connection) logs and re-enters a fixed backoff; the loop has no terminal
//! state besides shutdown.

pub mod client;
pub mod error;
pub mod frame;

pub use client::StreamClient;
pub use error::StreamError;
