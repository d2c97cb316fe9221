use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cqrs_es::AggregateError;
use domain::Error;
use serde_json::json;

/// Wire form of a failed operation. The `error` kind string is what the
/// calling surface branches on to distinguish "fix your input" from
/// "not allowed" from "out of stock, restock and retry".
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "unauthorized",
            message: "missing or invalid identity headers".to_string(),
        }
    }

    pub fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, kind) = match &err {
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Error::UnknownInventoryItem { .. } => {
                (StatusCode::NOT_FOUND, "unknown_inventory_item")
            }
            Error::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Error::InsufficientStock { .. } => (StatusCode::CONFLICT, "insufficient_stock"),
            Error::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
            Error::Uniqueness { .. } => (StatusCode::CONFLICT, "conflict"),
            Error::InvalidSchedule { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_schedule")
            }
            Error::InvalidQuantity { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_quantity")
            }
            Error::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl From<AggregateError<Error>> for ApiError {
    fn from(err: AggregateError<Error>) -> Self {
        match err {
            AggregateError::UserError(err) => err.into(),
            AggregateError::AggregateConflict => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                kind: "transient",
                message: "concurrent update, please retry".to_string(),
            },
            other => {
                tracing::error!("persistence failure: {}", other);
                Self::internal("unexpected persistence failure".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.kind, "message": self.message })),
        )
            .into_response()
    }
}
