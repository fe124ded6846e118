use std::sync::Arc;
use std::time::Duration;

use fitup_events::Hub;
use tokio_util::sync::CancellationToken;

/// Interval between heartbeat pings.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn a background task that queues a Ping on every realtime connection
/// every [`HEARTBEAT_INTERVAL`] until `cancel` fires.
pub fn start_heartbeat(hub: Arc<Hub>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Heartbeat stopping");
                    break;
                }
                _ = interval.tick() => {
                    let pinged = hub.ping_all().await;
                    tracing::debug!(pinged, "WebSocket heartbeat ping");
                }
            }
        }
    })
}
