//! Periodic expiry of pending coach invitations.
//!
//! Marks every pending invitation past its `expires_at` as expired. Runs on
//! a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fitup_services::CoachingService;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the invitation expiry loop until `cancel` is triggered.
pub async fn run(coaching: Arc<CoachingService>, cancel: CancellationToken) {
    run_every(coaching, SWEEP_INTERVAL, cancel).await;
}

pub async fn run_every(coaching: Arc<CoachingService>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Invitation expiry job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Invitation expiry job stopping");
                break;
            }
            _ = interval.tick() => {
                match coaching.expire_invitations(Utc::now()).await {
                    Ok(0) => tracing::debug!("Invitation expiry: nothing to expire"),
                    Ok(expired) => tracing::info!(expired, "Invitation expiry: marked invitations expired"),
                    Err(e) => tracing::error!(error = %e, "Invitation expiry: sweep failed"),
                }
            }
        }
    }
}
