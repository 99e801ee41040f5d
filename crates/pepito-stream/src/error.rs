use thiserror::Error;

/// Connection-level stream failures. Every variant is transient: the client
/// logs it and retries after the backoff interval. Per-line decode failures
/// are not represented here; they are logged and skipped without touching
/// the connection.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("event stream endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("event stream closed by remote")]
    Closed,
}
