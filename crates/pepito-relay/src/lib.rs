//! `pepito-relay` — event routing between the stream and the chat platform.
//!
//! The chat platform is abstracted behind [`ChatGateway`] so the dispatcher,
//! fan-out engine and reminder sweep stay platform-neutral and testable with
//! a mock. The serenity implementation lives in `pepito-discord`.

pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod gateway;
pub mod reminder;

pub use dispatch::run_dispatcher;
pub use error::DeliveryError;
pub use fanout::FanoutEngine;
pub use gateway::{ChatGateway, Notification, ServerInfo};
pub use reminder::ReminderSweep;
