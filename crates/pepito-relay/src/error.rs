use thiserror::Error;

/// Per-destination delivery failure. Collected, logged, never fatal to the
/// batch that produced it.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("channel {channel_id} is not resolvable")]
    ChannelNotFound { channel_id: String },

    #[error("send to channel {channel_id} failed: {reason}")]
    Send { channel_id: String, reason: String },
}
