//! Email delivery via the Resend HTTP API.
//!
//! Configuration comes from the environment; when `RESEND_API_KEY` or
//! `EMAIL_FROM` is missing, [`EmailConfig::from_env`] returns `None` and no
//! mailer should be constructed.

use std::time::Duration;

use serde::Serialize;

const DEFAULT_API_BASE: &str = "https://api.resend.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Network, DNS or timeout failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Resend answered with a non-2xx status.
    #[error("Email API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    /// RFC 5322 "From" address, e.g. `Fitup <noreply@fitup.app>`.
    pub from_address: String,
    /// API base URL; overridable for tests and proxies.
    pub api_base: String,
}

impl EmailConfig {
    /// | Variable          | Required | Default                  |
    /// |-------------------|----------|--------------------------|
    /// | `RESEND_API_KEY`  | yes      | -                        |
    /// | `EMAIL_FROM`      | yes      | -                        |
    /// | `RESEND_API_BASE` | no       | `https://api.resend.com` |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let from_address = std::env::var("EMAIL_FROM").ok().filter(|f| !f.trim().is_empty())?;
        Some(Self {
            api_key,
            from_address,
            api_base: std::env::var("RESEND_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub struct EmailDelivery {
    client: reqwest::Client,
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let url = format!("{}/emails", self.config.api_base.trim_end_matches('/'));
        let body = SendEmailRequest {
            from: &self.config.from_address,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_resend_shape() {
        let body = SendEmailRequest {
            from: "Fitup <noreply@fitup.app>",
            to: ["client@example.com"],
            subject: "Hi",
            html: "<p>Hi</p>",
            text: "Hi",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0], "client@example.com");
        assert_eq!(json["from"], "Fitup <noreply@fitup.app>");
        assert_eq!(json["html"], "<p>Hi</p>");
    }

    #[test]
    fn http_status_error_display() {
        let err = EmailError::HttpStatus {
            status: 422,
            body: "invalid from".into(),
        };
        assert_eq!(err.to_string(), "Email API returned HTTP 422: invalid from");
    }
}
