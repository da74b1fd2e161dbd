use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use iris_core::error::{self, ApiError};
use iris_core::messages::{MSG_CONFIRMATION_EXPIRED, MSG_CONVERSATION_NOT_FOUND};
use iris_core::service::ServiceError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
    },
    /// The pending-confirmation window closed (410)
    ConfirmationExpired { conversation_id: String },
    /// Conversation state is gone (404)
    ConversationNotFound { conversation_id: String },
    /// Conversation store failure (503)
    Store(String),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    conversation_id: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::ConfirmationExpired { conversation_id } => (
                StatusCode::GONE,
                ApiError {
                    error: error::codes::CONFIRMATION_EXPIRED.to_string(),
                    message: MSG_CONFIRMATION_EXPIRED.to_string(),
                    field: None,
                    received: None,
                    conversation_id: Some(conversation_id),
                    request_id,
                    docs_hint: Some(
                        "Confirmations are valid for a few minutes. Send the message again \
                         to arm a new confirmation."
                            .to_string(),
                    ),
                },
            ),
            AppError::ConversationNotFound { conversation_id } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::CONVERSATION_NOT_FOUND.to_string(),
                    message: MSG_CONVERSATION_NOT_FOUND.to_string(),
                    field: None,
                    received: None,
                    conversation_id: Some(conversation_id),
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Store(message) => {
                tracing::error!("Store error: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError {
                        error: error::codes::STORE_UNAVAILABLE.to_string(),
                        message: "Conversation store is unavailable".to_string(),
                        field: None,
                        received: None,
                        conversation_id: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        conversation_id: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ConfirmationExpired { conversation_id } => {
                AppError::ConfirmationExpired { conversation_id }
            }
            ServiceError::ConversationNotFound { conversation_id } => {
                AppError::ConversationNotFound { conversation_id }
            }
            ServiceError::Store(store_err) => AppError::Store(store_err.to_string()),
        }
    }
}
