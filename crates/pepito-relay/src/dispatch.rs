use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pepito_core::event::{DoorEvent, DOMAIN_TAG};

use crate::fanout::FanoutEngine;
use crate::gateway::ChatGateway;

/// Consume decoded stream payloads and route door events to fan-out.
///
/// Heartbeats are already filtered upstream; any other non-domain tag is
/// ignored silently. A malformed domain payload is logged and dropped whole.
/// Runs until the stream side closes the channel.
pub async fn run_dispatcher<G: ChatGateway>(
    mut rx: mpsc::Receiver<Value>,
    fanout: FanoutEngine<G>,
) {
    while let Some(payload) = rx.recv().await {
        let tag = payload.get("event").and_then(Value::as_str).unwrap_or("");
        if tag != DOMAIN_TAG {
            debug!(tag, "ignoring non-domain event");
            continue;
        }
        match DoorEvent::from_payload(&payload) {
            Ok(event) => fanout.deliver(&event).await,
            Err(e) => warn!(error = %e, "malformed door event dropped"),
        }
    }
    info!("dispatcher exiting (stream channel closed)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::MockGateway;
    use pepito_store::{ChannelDirectory, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    async fn dispatch_all(payloads: Vec<Value>) -> Vec<(String, crate::Notification)> {
        let directory = Arc::new(ChannelDirectory::new(Box::new(MemoryStore::new())));
        directory.set_channel("1", "Alpha", "101").unwrap();
        let gateway = Arc::new(MockGateway::default());
        let fanout = FanoutEngine::new(directory, Arc::clone(&gateway));

        let (tx, rx) = mpsc::channel(16);
        let dispatcher = tokio::spawn(run_dispatcher(rx, fanout));
        for payload in payloads {
            tx.send(payload).await.unwrap();
        }
        drop(tx);
        dispatcher.await.unwrap();

        gateway.notifications()
    }

    #[tokio::test]
    async fn only_domain_payloads_reach_fanout() {
        let sends = dispatch_all(vec![
            json!({"event": "heartbeat"}),
            json!({"event": "weather", "temp": 3}),
            json!({"event": "pepito", "type": "out", "time": 1_700_000_000,
                   "img": "https://example.com/a.jpg"}),
            json!({"event": "pepito", "type": "in", "time": 1_700_000_100,
                   "img": "https://example.com/b.jpg"}),
        ])
        .await;

        assert_eq!(sends.len(), 2, "exactly one delivery per domain payload");
    }

    #[tokio::test]
    async fn malformed_domain_payloads_produce_zero_deliveries() {
        let sends = dispatch_all(vec![
            json!({"event": "pepito", "type": "out",
                   "img": "https://example.com/a.jpg"}), // no time
            json!({"event": "pepito", "time": 1_700_000_000,
                   "img": "https://example.com/a.jpg"}), // no type
            json!({"event": "pepito", "type": "out", "time": 1_700_000_000}), // no img
        ])
        .await;

        assert!(sends.is_empty());
    }
}
