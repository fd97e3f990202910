//! Domain logic shared by every vault crate.
//!
//! Nothing in here touches the database: quality and access decisions are
//! pure functions over already-loaded facts, and the media modules wrap the
//! external `ffmpeg` / `ffprobe` tools.

pub mod access;
pub mod encode;
pub mod error;
pub mod ffmpeg;
pub mod probe;
pub mod quality;
pub mod transcoding;
pub mod types;
pub mod waveform;
