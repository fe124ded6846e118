use fitup_core::error::CoreError;

/// Errors surfaced by every repository operation.
///
/// Store-specific failures are classified once, here, so callers only ever
/// branch on `NotFound` / `Conflict` and treat the rest as infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Infrastructure(sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::not_found("row", "unknown"),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                RepoError::Conflict(db_err.constraint().unwrap_or("unknown").to_string())
            }
            other => RepoError::Infrastructure(other),
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            RepoError::Conflict(constraint) => CoreError::Conflict(constraint),
            RepoError::Infrastructure(e) => {
                tracing::error!(error = %e, "Repository failure");
                CoreError::Infrastructure(e.to_string())
            }
        }
    }
}

/// Helper for `fetch_optional` lookups that must exist.
pub(crate) trait OrNotFound<T> {
    fn or_not_found(self, entity: &'static str, id: impl ToString) -> RepoResult<T>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, entity: &'static str, id: impl ToString) -> RepoResult<T> {
        self.ok_or_else(|| RepoError::not_found(entity, id))
    }
}
