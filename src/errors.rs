use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Invalid service selected: {0}")]
    UnknownService(String),

    #[error("This time slot is already booked. Please choose a different time.")]
    SlotConflict,

    #[error("Invalid amount. Minimum \u{20b9}{0} required.")]
    AmountTooSmall(i64),

    #[error("Payment verification failed")]
    SignatureMismatch,

    #[error("Invalid {0} status")]
    InvalidStatus(&'static str),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Admin access required")]
    Forbidden,

    #[error("payment gateway error: {0}")]
    Gateway(anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnknownService(_)
            | AppError::AmountTooSmall(_)
            | AppError::SignatureMismatch
            | AppError::InvalidStatus(_)
            | AppError::InvalidTransition(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SlotConflict => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the client. Server-side failures keep
    /// their detail in the logs only.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Gateway(_) => "Payment gateway error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = serde_json::json!({
            "success": false,
            "message": self.public_message(),
        });
        if let AppError::Validation(errors) = &self {
            body["errors"] = serde_json::json!(errors);
        }
        if status.is_server_error() && cfg!(debug_assertions) {
            body["error"] = serde_json::json!(self.to_string());
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(AppError::SlotConflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::SignatureMismatch.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Booking not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("Unauthorized").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Gateway(anyhow::anyhow!("timeout")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn server_errors_hide_detail_in_public_message() {
        let err = AppError::Internal(anyhow::anyhow!("users table is on fire"));
        assert_eq!(err.public_message(), "Internal server error");
        let err = AppError::Gateway(anyhow::anyhow!("connection refused"));
        assert_eq!(err.public_message(), "Payment gateway error");
    }
}
