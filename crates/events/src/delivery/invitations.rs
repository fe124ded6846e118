//! Invitation mailer.
//!
//! Listens for `invitation.created` / `invitation.resent` on the bus and
//! emails the accept link. Without an email configuration the link is logged
//! instead, which is what local development relies on.

use chrono::SecondsFormat;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{event_types, DomainEvent, InvitationNotice};
use crate::delivery::email::{EmailDelivery, OutgoingEmail};

pub struct InvitationMailer {
    email: Option<EmailDelivery>,
    frontend_url: String,
}

impl InvitationMailer {
    pub fn new(email: Option<EmailDelivery>, frontend_url: impl Into<String>) -> Self {
        Self {
            email,
            frontend_url: frontend_url.into(),
        }
    }

    /// Link the invitee follows to accept.
    pub fn accept_link(&self, token: &str) -> String {
        format!(
            "{}/invitations/accept?token={token}",
            self.frontend_url.trim_end_matches('/')
        )
    }

    /// Build the email for an invitation event; `None` for other events or
    /// malformed payloads.
    pub fn prepare(&self, event: &DomainEvent) -> Option<OutgoingEmail> {
        let resent = match event.event_type.as_str() {
            event_types::INVITATION_CREATED => false,
            event_types::INVITATION_RESENT => true,
            _ => return None,
        };
        let notice: InvitationNotice = match serde_json::from_value(event.payload.clone()) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, event_type = %event.event_type, "Malformed invitation payload");
                return None;
            }
        };

        let link = self.accept_link(&notice.token);
        let expires = notice.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let subject = if resent {
            "Reminder: your Fitup coaching invitation".to_string()
        } else {
            "You're invited to train with a Fitup coach".to_string()
        };
        let text = format!(
            "You have been invited to join a coach on Fitup.\n\nAccept the invitation: {link}\n\nThis link expires at {expires}."
        );
        let html = format!(
            "<p>You have been invited to join a coach on Fitup.</p>\
             <p><a href=\"{link}\">Accept the invitation</a></p>\
             <p>This link expires at {expires}.</p>"
        );
        Some(OutgoingEmail {
            to: notice.email,
            subject,
            html,
            text,
        })
    }

    /// Consume bus events until cancelled or the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Invitation mailer cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Invitation mailer lagged, some invitations were not mailed");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, invitation mailer shutting down");
                        break;
                    }
                },
            };

            let Some(email) = self.prepare(&event) else {
                continue;
            };
            match &self.email {
                Some(delivery) => {
                    if let Err(e) = delivery.send(&email).await {
                        tracing::error!(error = %e, to = %email.to, "Failed to send invitation email");
                    }
                }
                None => {
                    tracing::info!(to = %email.to, body = %email.text, "Email delivery not configured; invitation not sent");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::bus::EventBus;

    fn notice() -> InvitationNotice {
        InvitationNotice {
            invitation_id: Uuid::nil(),
            coach_id: "coach-1".into(),
            email: "client@example.com".into(),
            token: "t0k3n".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 10, 24, 9, 0, 0).unwrap(),
        }
    }

    fn mailer() -> InvitationMailer {
        InvitationMailer::new(None, "https://app.fitup.test/")
    }

    #[test]
    fn builds_accept_link_email() {
        let event = DomainEvent::invitation(event_types::INVITATION_CREATED, &notice());
        let email = mailer().prepare(&event).unwrap();
        assert_eq!(email.to, "client@example.com");
        assert!(email
            .text
            .contains("https://app.fitup.test/invitations/accept?token=t0k3n"));
        assert!(email.text.contains("2026-10-24T09:00:00Z"));
        assert!(!email.subject.starts_with("Reminder"));
    }

    #[test]
    fn resent_invitation_is_a_reminder() {
        let event = DomainEvent::invitation(event_types::INVITATION_RESENT, &notice());
        assert!(mailer().prepare(&event).unwrap().subject.starts_with("Reminder"));
    }

    #[test]
    fn ignores_unrelated_and_malformed_events() {
        assert!(mailer().prepare(&DomainEvent::new(event_types::PLAN_ADAPTED)).is_none());
        let broken = DomainEvent::new(event_types::INVITATION_CREATED)
            .with_payload(serde_json::json!({"email": 3}));
        assert!(mailer().prepare(&broken).is_none());
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(mailer().run(bus.subscribe(), cancel.clone()));

        bus.publish(DomainEvent::invitation(event_types::INVITATION_CREATED, &notice()));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_when_the_bus_is_dropped() {
        let bus = EventBus::default();
        let task = tokio::spawn(mailer().run(bus.subscribe(), CancellationToken::new()));
        drop(bus);
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
