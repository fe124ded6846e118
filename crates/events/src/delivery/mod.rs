//! Outbound delivery channels.
//!
//! Email goes through the Resend HTTP API; the invitation mailer consumes
//! invitation events from the bus and sends the accept link.

pub mod email;
pub mod invitations;
