//! WebSocket edge of the realtime messaging hub.
//!
//! Provides the HTTP upgrade handler and the heartbeat task. Connection
//! state itself lives in [`fitup_events::Hub`].

mod handler;
mod heartbeat;

pub use handler::{ws_handler, READ_TIMEOUT};
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
