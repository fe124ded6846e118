use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fitup_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`]; implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status code and stable error code for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::NotEstimable(_) => (StatusCode::BAD_REQUEST, "NOT_ESTIMABLE"),
                CoreError::UnrealisticEstimate { .. } => (StatusCode::BAD_REQUEST, "UNREALISTIC_ESTIMATE"),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                CoreError::Expired(_) => (StatusCode::GONE, "EXPIRED"),
                CoreError::NoSuitableTemplate(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NO_SUITABLE_TEMPLATE"),
                CoreError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = match &self {
            AppError::Core(CoreError::NotFound { entity, id }) => format!("{entity} with id {id} not found"),
            AppError::Core(CoreError::Infrastructure(msg)) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            AppError::Core(CoreError::Validation(msg))
            | AppError::Core(CoreError::Conflict(msg))
            | AppError::Core(CoreError::Unauthorized(msg))
            | AppError::Core(CoreError::Forbidden(msg))
            | AppError::Core(CoreError::Expired(msg))
            | AppError::Core(CoreError::NotEstimable(msg))
            | AppError::Core(CoreError::NoSuitableTemplate(msg)) => msg.clone(),
            AppError::Core(err @ CoreError::UnrealisticEstimate { .. }) => err.to_string(),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::not_found("Plan", 1), StatusCode::NOT_FOUND),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (CoreError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (CoreError::Expired("x".into()), StatusCode::GONE),
            (
                CoreError::UnrealisticEstimate {
                    previous: 100.0,
                    proposed: 130.0,
                },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NoSuitableTemplate("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::Infrastructure("pool".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::Core(err).into_response().status(), status);
        }
    }
}
