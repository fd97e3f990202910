//! Background subscriber that traces every bus event.

use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Writes each [`PlatformEvent`] to the tracing output.
pub struct EventLogger;

impl EventLogger {
    /// Run until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::log(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
    }

    fn log(event: &PlatformEvent) {
        tracing::info!(
            event_type = %event.event_type,
            source_entity_type = event.source_entity_type.as_deref(),
            source_entity_id = event.source_entity_id,
            recipient_user_id = event.recipient_user_id,
            payload = %event.payload,
            "Event"
        );
    }
}
