use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(String),
}

/// A stream payload that cannot be promoted to a [`crate::DoorEvent`].
///
/// Malformed events are dropped whole: a payload missing any required
/// field produces zero deliveries.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event missing required field `{0}`")]
    MissingField(&'static str),

    #[error("event field `{0}` is invalid")]
    InvalidField(&'static str),
}
