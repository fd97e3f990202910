//! Background transcoding pipeline and stream selection.
//!
//! - [`Transcoder`]: bounded job queue drained by a fixed pool of worker
//!   tasks. Each job encodes a source file to the lossy tier, records the
//!   result and extracts a waveform.
//! - [`resolve_stream_file`] / [`locate_stream`]: pick the servable file
//!   for a version, falling back across quality tiers.
//! - [`check_track_access`]: ownership and share-grant evaluation.
//!
//! Persistence, media tools and notifications are injected through the
//! traits in [`store`], [`tools`] and
//! [`vault_core::transcoding::TranscodingNotifier`].

pub mod access;
pub mod config;
pub mod error;
pub mod job;
pub mod store;
pub mod stream;
pub mod tools;
pub mod transcoder;

pub use access::check_track_access;
pub use config::TranscoderConfig;
pub use error::{PipelineError, StoreError, StreamError};
pub use job::{Job, TranscodeVersionInput};
pub use store::{AccessStore, PgStore, StreamStore, TranscodeStore};
pub use stream::{locate_stream, resolve_stream_file, StreamFile};
pub use tools::{FfmpegTools, MediaTools};
pub use transcoder::{Transcoder, VersionTranscoder};
