//! Fitup event bus, realtime hub and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe for [`DomainEvent`]s,
//!   backed by `tokio::sync::broadcast`.
//! - [`Hub`]: the realtime messaging hub: one outbound queue per connected
//!   user and `conversation:{id}` channel subscriptions.
//! - [`delivery`]: outbound email of invitation links.

pub mod bus;
pub mod delivery;
pub mod hub;

pub use bus::{DomainEvent, EventBus, InvitationNotice};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::invitations::InvitationMailer;
pub use hub::{Hub, HubFrame};
