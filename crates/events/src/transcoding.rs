//! Transcoding progress as bus events.

use vault_core::transcoding::{TranscodingNotifier, TranscodingStatus};
use vault_core::types::DbId;

use crate::bus::{EventBus, PlatformEvent};

/// Event type published for every lossy-encode status change.
pub const TRANSCODING_UPDATED: &str = "transcoding.updated";

impl TranscodingNotifier for EventBus {
    fn notify_transcoding_update(
        &self,
        user_id: DbId,
        track_public_id: &str,
        version_id: DbId,
        status: TranscodingStatus,
    ) {
        self.publish(
            PlatformEvent::new(TRANSCODING_UPDATED)
                .with_source("track_version", version_id)
                .with_recipient(user_id)
                .with_payload(serde_json::json!({
                    "track_public_id": track_public_id,
                    "version_id": version_id,
                    "status": status.as_str(),
                })),
        );
    }
}
