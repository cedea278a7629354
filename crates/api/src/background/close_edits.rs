//! Periodic sweep that settles edits whose voting period has elapsed.
//!
//! Runs on a fixed interval using `tokio::time::interval`. Each pass
//! settles expired edits by simple majority and re-checks destructive
//! edits that were held back by the destructive voting period.

use std::sync::Arc;
use std::time::Duration;

use curio_edits::EditService;
use tokio_util::sync::CancellationToken;

/// Run the close-edits sweep loop until `cancel` is triggered.
pub async fn run(service: Arc<EditService>, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "Close-edits sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Close-edits sweep stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = service.close_completed_edits().await {
                    tracing::error!(error = %e, "Close-edits sweep failed");
                }
            }
        }
    }
}
