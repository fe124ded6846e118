use std::sync::Arc;

use fitup_db::Repository;
use fitup_events::{EventBus, Hub};
use fitup_services::Services;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub services: Services,
    /// Realtime messaging hub (one socket per user).
    pub hub: Arc<Hub>,
    pub event_bus: Arc<EventBus>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the services over `repo` with a fresh hub and event bus.
    pub fn new(repo: Arc<dyn Repository>, config: ServerConfig) -> Self {
        let hub = Arc::new(Hub::new());
        let event_bus = Arc::new(EventBus::default());
        let services = Services::new(Arc::clone(&repo), Arc::clone(&hub), Arc::clone(&event_bus));
        Self {
            repo,
            services,
            hub,
            event_bus,
            config: Arc::new(config),
        }
    }
}
