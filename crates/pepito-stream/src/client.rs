use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::frame::{decode_line, is_heartbeat, LineDecoder};

/// Reconnecting client for the cat-door event stream.
///
/// `Connecting → Streaming → (on any failure) → Backoff → Connecting`,
/// for the lifetime of the process. Only the shutdown signal (or the
/// payload receiver going away) ends the loop; the backoff sleep itself is
/// interruptible so shutdown is never delayed by a pending retry.
pub struct StreamClient {
    url: String,
    backoff: Duration,
    http: reqwest::Client,
}

impl StreamClient {
    pub fn new(url: String, backoff: Duration) -> Self {
        Self {
            url,
            backoff,
            http: reqwest::Client::new(),
        }
    }

    pub async fn run(self, tx: mpsc::Sender<Value>, mut shutdown: watch::Receiver<bool>) {
        info!(url = %self.url, "event stream client started");
        loop {
            let outcome = tokio::select! {
                outcome = self.stream_once(&tx) => outcome,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            };

            match outcome {
                // The payload receiver is gone, nothing left to feed.
                Ok(()) => break,
                Err(e) => warn!(
                    error = %e,
                    retry_secs = self.backoff.as_secs(),
                    "event stream failed, reconnecting after backoff"
                ),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.backoff) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("event stream client stopped");
    }

    /// One connect-and-read pass. `Ok(())` only when the payload receiver
    /// has been dropped; every other exit is an error to be retried.
    async fn stream_once(&self, tx: &mpsc::Sender<Value>) -> Result<(), StreamError> {
        let resp = self.http.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StreamError::Status(status));
        }
        info!("connected to event stream");

        let mut decoder = LineDecoder::new();
        let mut chunks = resp.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            for line in decoder.push(&chunk) {
                let Some(payload) = decode_line(&line) else {
                    continue;
                };
                if is_heartbeat(&payload) {
                    debug!("heartbeat");
                    continue;
                }
                if tx.send(payload).await.is_err() {
                    return Ok(());
                }
            }
        }

        Err(StreamError::Closed)
    }
}
