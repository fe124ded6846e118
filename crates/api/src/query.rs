//! Shared query parameter types for API handlers.

use fitup_core::types::UserId;
use serde::Deserialize;

use crate::middleware::auth::AuthUser;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped in the service layer.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?limit=` only, for newest-first listings.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Optional `?user_id=` naming whose records to act on. Defaults to the
/// caller; the service decides whether the caller may touch another user.
#[derive(Debug, Default, Deserialize)]
pub struct UserScope {
    pub user_id: Option<UserId>,
}

impl UserScope {
    pub fn resolve(&self, auth: &AuthUser) -> UserId {
        self.user_id.clone().unwrap_or_else(|| auth.user_id.clone())
    }
}

/// Query parameters for list endpoints that support an `include_inactive` flag.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeInactiveParams {
    #[serde(default)]
    pub include_inactive: bool,
}
