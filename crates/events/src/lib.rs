//! Vault event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope.
//! - The [`TranscodingNotifier`](vault_core::transcoding::TranscodingNotifier)
//!   implementation that turns pipeline progress into
//!   `transcoding.updated` events.
//! - [`EventLogger`]: background task that traces every event.

pub mod bus;
pub mod logger;
pub mod transcoding;

pub use bus::{EventBus, PlatformEvent};
pub use logger::EventLogger;
pub use transcoding::TRANSCODING_UPDATED;
