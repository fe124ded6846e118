use std::str::FromStr;

use fitup_events::EmailConfig;

use crate::auth::jwt::JwtConfig;

/// Startup configuration failures. Any of these aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{0}")]
    WeakSecret(String),
}

/// OAuth client credentials for one provider. Carried for the auth
/// collaborator; this server does not run the OAuth flows itself.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    pub google: Option<OAuthClient>,
    pub apple: Option<OAuthClient>,
    pub facebook: Option<OAuthClient>,
}

impl OAuthConfig {
    fn from_env() -> Self {
        Self {
            google: oauth_client("GOOGLE"),
            apple: oauth_client("APPLE"),
            facebook: oauth_client("FACEBOOK"),
        }
    }
}

fn oauth_client(provider: &str) -> Option<OAuthClient> {
    let client_id = non_empty_var(&format!("{provider}_CLIENT_ID"))?;
    let client_secret = non_empty_var(&format!("{provider}_CLIENT_SECRET"))?;
    Some(OAuthClient {
        client_id,
        client_secret,
    })
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    pub database_url: String,
    /// Frontend origin; allowed by CORS and used as the invitation link base.
    pub frontend_url: String,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for realtime queues to drain (default: `5`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// `None` disables invitation email; links are logged instead.
    pub email: Option<EmailConfig>,
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `DATABASE_URL`          | required                |
    /// | `FRONTEND_URL`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `5`                     |
    ///
    /// JWT, email and OAuth variables are documented on their own loaders.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = non_empty_var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000)?,
            database_url,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into())
                .trim_end_matches('/')
                .to_string(),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 5)?,
            jwt: JwtConfig::from_env()?,
            email: EmailConfig::from_env(),
            oauth: OAuthConfig::from_env(),
        })
    }
}

/// Parse `var` when set, otherwise return `default`.
pub(crate) fn env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
