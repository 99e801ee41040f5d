pub mod config;
pub mod error;
pub mod event;

pub use config::PepitoConfig;
pub use error::{ConfigError, EventError};
pub use event::DoorEvent;
