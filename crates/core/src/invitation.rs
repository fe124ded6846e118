//! Coach invitation tokens and lifecycle rules.
//!
//! The plaintext token is handed out exactly once (on create / resend); only
//! its SHA-256 digest is stored.

use chrono::Duration;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::enums::define_text_enum;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Invitation lifetime.
pub const INVITATION_TTL_DAYS: i64 = 7;
/// Random bytes in a token (hex-encoded to twice as many characters).
pub const TOKEN_BYTES: usize = 32;

define_text_enum! {
    InvitationStatus("invitation status") {
        Pending = "pending",
        Accepted = "accepted",
        Expired = "expired",
        Cancelled = "cancelled",
    }
}

/// Generate a fresh random token (64 hex characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Digest stored in place of the token.
pub fn hash_token(token: &str) -> String {
    let hash = Sha256::digest(token.trim().as_bytes());
    format!("{hash:x}")
}

pub fn expires_at(now: Timestamp) -> Timestamp {
    now + Duration::days(INVITATION_TTL_DAYS)
}

/// Check that an invitation can be accepted at `now`.
///
/// A pending invitation past its expiry reports `Expired` just like one the
/// sweep already marked; accepted and cancelled ones are conflicts.
pub fn ensure_acceptable(status: InvitationStatus, expires_at: Timestamp, now: Timestamp) -> Result<(), CoreError> {
    match status {
        InvitationStatus::Pending if now >= expires_at => {
            Err(CoreError::Expired("invitation has expired".into()))
        }
        InvitationStatus::Pending => Ok(()),
        InvitationStatus::Expired => Err(CoreError::Expired("invitation has expired".into())),
        InvitationStatus::Accepted => Err(CoreError::Conflict("invitation was already accepted".into())),
        InvitationStatus::Cancelled => Err(CoreError::Conflict("invitation was cancelled".into())),
    }
}

/// Pending and expired invitations may be resent; resending reopens them.
pub fn ensure_resendable(status: InvitationStatus) -> Result<(), CoreError> {
    match status {
        InvitationStatus::Pending | InvitationStatus::Expired => Ok(()),
        other => Err(CoreError::Conflict(format!("invitation is {other}"))),
    }
}

/// Only pending invitations may be cancelled.
pub fn ensure_pending(status: InvitationStatus) -> Result<(), CoreError> {
    if status != InvitationStatus::Pending {
        return Err(CoreError::Conflict(format!("invitation is {status}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn tokens_are_random_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_and_trims() {
        assert_eq!(hash_token("abc"), hash_token(" abc "));
        assert_eq!(
            hash_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn ttl_is_seven_days() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();
        assert_eq!(expires_at(now), Utc.with_ymd_and_hms(2026, 10, 24, 0, 0, 0).unwrap());
    }

    #[test]
    fn acceptance_rules() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();
        let later = now + Duration::days(1);
        assert!(ensure_acceptable(InvitationStatus::Pending, later, now).is_ok());
        assert!(matches!(
            ensure_acceptable(InvitationStatus::Pending, now, now),
            Err(CoreError::Expired(_))
        ));
        assert!(matches!(
            ensure_acceptable(InvitationStatus::Accepted, later, now),
            Err(CoreError::Conflict(_))
        ));
        assert!(matches!(
            ensure_acceptable(InvitationStatus::Cancelled, later, now),
            Err(CoreError::Conflict(_))
        ));
        assert!(ensure_pending(InvitationStatus::Expired).is_err());
    }

    #[test]
    fn expired_invitations_can_be_resent() {
        assert!(ensure_resendable(InvitationStatus::Pending).is_ok());
        assert!(ensure_resendable(InvitationStatus::Expired).is_ok());
        assert!(matches!(
            ensure_resendable(InvitationStatus::Accepted),
            Err(CoreError::Conflict(_))
        ));
        assert!(matches!(
            ensure_resendable(InvitationStatus::Cancelled),
            Err(CoreError::Conflict(_))
        ));
    }
}
