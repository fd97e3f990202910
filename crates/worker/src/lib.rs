//! Transcoding worker process.
//!
//! The binary in `main.rs` wires the database, the event bus and the
//! transcoder pool together; [`config`] holds its settings and
//! [`startup`] the shutdown-aware reconciliation step.

pub mod config;
pub mod startup;
