/// Domain error kinds shared by every layer above the repository.
///
/// The HTTP edge maps each variant to a status code; the core never formats
/// responses itself.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Unrealistic estimate: {proposed:.2} vs previous {previous:.2}")]
    UnrealisticEstimate { previous: f64, proposed: f64 },

    #[error("No suitable template: {0}")]
    NoSuitableTemplate(String),

    #[error("Not estimable: {0}")]
    NotEstimable(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result alias used across the core and service layers.
pub type CoreResult<T> = Result<T, CoreError>;
