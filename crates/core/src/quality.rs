//! Quality tiers and the stream quality resolution policy.
//!
//! Resolution happens in two stages. [`resolve_quality`] picks the tier to
//! attempt first from the caller's explicit request, the project override
//! and the user's stored default. [`fallback_chain`] then yields the full
//! lookup order for that starting tier.

use serde::{Deserialize, Serialize};

/// Tier used when neither the request, the project nor the user names one.
pub const DEFAULT_QUALITY: Quality = Quality::Lossy;

/// Fixed fallback order tried after the preferred tier.
const FALLBACK_ORDER: [Quality; 3] = [Quality::Lossy, Quality::Source, Quality::Lossless];

/// One encoded variant of a track version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// The file exactly as uploaded.
    Source,
    Lossless,
    /// The 320 kbit/s distribution copy produced by the transcoder.
    Lossy,
}

impl Quality {
    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Source => "source",
            Quality::Lossless => "lossless",
            Quality::Lossy => "lossy",
        }
    }

    /// Parse a tier name. Returns `None` for anything other than the
    /// three known lowercase names.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "source" => Some(Quality::Source),
            "lossless" => Some(Quality::Lossless),
            "lossy" => Some(Quality::Lossy),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide which tier to attempt first.
///
/// Precedence: a valid explicit request, then the project's override, then
/// the user's default preference, then [`DEFAULT_QUALITY`]. Unknown tier
/// names at any level are skipped as if absent.
pub fn resolve_quality(
    requested: Option<&str>,
    project_override: Option<&str>,
    user_default: Option<&str>,
) -> Quality {
    [requested, project_override, user_default]
        .into_iter()
        .flatten()
        .find_map(Quality::parse)
        .unwrap_or(DEFAULT_QUALITY)
}

/// Full lookup order starting from `preferred`.
///
/// The preferred tier comes first, followed by lossy, source and lossless
/// with the preferred tier skipped. Always yields every tier exactly once.
pub fn fallback_chain(preferred: Quality) -> Vec<Quality> {
    std::iter::once(preferred)
        .chain(FALLBACK_ORDER.into_iter().filter(|q| *q != preferred))
        .collect()
}

// ---------------------------------------------------------------------------
// Streaming content types
// ---------------------------------------------------------------------------

/// MIME type served for a stored container format.
pub fn content_type_for_format(format: &str) -> &'static str {
    match format {
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        _ => "audio/mpeg",
    }
}
