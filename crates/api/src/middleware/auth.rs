//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use fitup_core::error::CoreError;
use fitup_core::roles::Role;
use fitup_core::types::UserId;
use fitup_services::Actor;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %auth.user_id, role = %auth.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Opaque auth id (from `claims.sub`).
    pub user_id: UserId,
    pub role: Role,
    pub email: Option<String>,
}

impl AuthUser {
    /// The caller as seen by the service layer.
    pub fn actor(&self) -> Actor {
        let actor = Actor::new(self.user_id.clone(), self.role);
        match &self.email {
            Some(email) => actor.with_email(email.clone()),
            None => actor,
        }
    }

    /// Verify a raw token against the configured secret.
    pub fn from_token(token: &str, state: &AppState) -> Result<Self, AppError> {
        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }
}

/// The token from a `Bearer` `Authorization` header, when present.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(header) = headers.get("authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Malformed Authorization header".into())))?;
    value.strip_prefix("Bearer ").map(Some).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing Authorization header".into())))?;
        AuthUser::from_token(token, state)
    }
}
