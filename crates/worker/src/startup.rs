//! Startup reconciliation that gives way to a shutdown request.

use std::future::Future;
use std::pin::Pin;

use vault_pipeline::Transcoder;

/// Requeue unfinished transcodes unless `shutdown` resolves first.
///
/// A backlog larger than the queue parks the requeue until workers free
/// room, so the shutdown future is raced against it and polled first.
/// Returns `true` if shutdown was requested before reconciliation finished.
pub async fn reconcile_unless_shutdown<F>(transcoder: &Transcoder, shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        () = shutdown => {
            tracing::info!("Shutdown requested during startup reconciliation");
            true
        }
        result = transcoder.requeue_unfinished() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Startup reconciliation failed");
            }
            false
        }
    }
}
