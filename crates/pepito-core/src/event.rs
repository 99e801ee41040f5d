//! Domain events decoded from the cat-door stream.
//!
//! The stream carries JSON payloads tagged by an `event` field. Only
//! `"pepito"`-tagged payloads describe door activity; `"heartbeat"` is a
//! keep-alive that must never reach fan-out.

use chrono::{DateTime, Utc};
use chrono_tz::Europe::Oslo;
use serde_json::Value;

use crate::error::EventError;

/// Payload tag for door activity.
pub const DOMAIN_TAG: &str = "pepito";
/// Payload tag for stream keep-alives; always discarded.
pub const HEARTBEAT_TAG: &str = "heartbeat";

/// One observed cat-door event. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorEvent {
    /// Motion state: `"in"`, `"out"`, or another free-form state.
    pub kind: String,
    /// Source-provided instant of the observation.
    pub occurred_at: DateTime<Utc>,
    /// Snapshot image taken at the door.
    pub image_url: String,
}

impl DoorEvent {
    /// Promote a `"pepito"`-tagged payload to a typed event.
    ///
    /// The payload must carry all of `type`, `time` (epoch seconds) and
    /// `img`; anything less is malformed and the whole event is rejected.
    pub fn from_payload(payload: &Value) -> Result<Self, EventError> {
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingField("type"))?;
        let epoch = payload
            .get("time")
            .and_then(Value::as_i64)
            .ok_or(EventError::MissingField("time"))?;
        let image_url = payload
            .get("img")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingField("img"))?;

        let occurred_at =
            DateTime::from_timestamp(epoch, 0).ok_or(EventError::InvalidField("time"))?;

        Ok(Self {
            kind: kind.to_string(),
            occurred_at,
            image_url: image_url.to_string(),
        })
    }

    /// Notification title, with the event time rendered in Pépito's local
    /// timezone.
    pub fn title(&self) -> String {
        let time = format_local_time(self.occurred_at);
        if self.kind == "in" {
            format!("Pépito is back home! ({time})")
        } else {
            format!("Pépito is {}! ({time})", self.kind)
        }
    }
}

/// Format an instant as `HH:MM:SS` in Europe/Oslo (the door's civil time,
/// DST included).
pub fn format_local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Oslo).format("%H:%M:%S").to_string()
}
