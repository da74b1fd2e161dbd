use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use iris_core::service::{Confirm, NewMessage};
use iris_core::state::{InputKind, Intent};

use crate::error::AppError;
use crate::state::AppState;

const MAX_TEXT_LENGTH: usize = 2000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/message", post(handle_message))
        .route("/ai/confirm", post(handle_confirm))
}

/// Request for the message endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AiMessageRequest {
    /// Existing conversation ID, or null for a new conversation
    pub conversation_id: Option<String>,
    /// Tenant identifier
    pub tenant_id: String,
    /// User identifier, when the transport knows it
    pub user_id: Option<String>,
    /// User message (1..=2000 characters)
    pub text: String,
    /// Input kind; defaults to text
    #[serde(default)]
    pub input_kind: InputKind,
}

/// Response from the message endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct AiMessageResponse {
    pub conversation_id: String,
    /// Assistant response text
    pub response: String,
    /// Whether a confirmation round-trip is required before execution
    pub requires_confirmation: bool,
    /// Suggested action (e.g. "create_boleto")
    pub suggested_action: Option<Intent>,
    /// Detected intent
    pub intent: Option<Intent>,
}

/// Request for the confirm endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AiConfirmRequest {
    pub conversation_id: String,
    pub tenant_id: String,
    /// true executes the pending action; false cancels it
    pub confirmed: bool,
}

/// Response from the confirm endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct AiConfirmResponse {
    pub conversation_id: String,
    pub response: String,
    /// Whether the pending action actually executed
    pub action_executed: bool,
    /// Tool result when the action executed
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.is_empty() {
        return Err(AppError::Validation {
            message: "text must not be empty".to_string(),
            field: Some("text".to_string()),
            received: None,
        });
    }
    if text.len() > MAX_TEXT_LENGTH {
        return Err(AppError::Validation {
            message: format!("text must be at most {MAX_TEXT_LENGTH} characters"),
            field: Some("text".to_string()),
            received: Some(serde_json::Value::Number(text.len().into())),
        });
    }
    Ok(())
}

/// Process a user message through the conversation pipeline.
///
/// Creates a new conversation or continues an existing one, persists the
/// terminal state, and reports whether a confirmation is now pending.
#[utoipa::path(
    post,
    path = "/ai/message",
    request_body = AiMessageRequest,
    responses(
        (status = 200, description = "Message processed", body = AiMessageResponse),
        (status = 400, description = "Invalid request", body = iris_core::error::ApiError),
        (status = 503, description = "Conversation store unavailable", body = iris_core::error::ApiError)
    ),
    tag = "ai"
)]
pub async fn handle_message(
    State(state): State<AppState>,
    Json(request): Json<AiMessageRequest>,
) -> Result<Json<AiMessageResponse>, AppError> {
    validate_text(&request.text)?;

    if request.tenant_id.is_empty() {
        return Err(AppError::Validation {
            message: "tenant_id must not be empty".to_string(),
            field: Some("tenant_id".to_string()),
            received: None,
        });
    }

    tracing::info!(
        conversation_id = request.conversation_id.as_deref().unwrap_or(""),
        tenant_id = %request.tenant_id,
        text_length = request.text.len(),
        "ai message received"
    );

    let outcome = state
        .service
        .handle_message(NewMessage {
            conversation_id: request.conversation_id,
            tenant_id: request.tenant_id,
            user_id: request.user_id,
            text: request.text,
            input_kind: request.input_kind,
        })
        .await?;

    Ok(Json(AiMessageResponse {
        conversation_id: outcome.conversation_id,
        response: outcome.response,
        requires_confirmation: outcome.requires_confirmation,
        suggested_action: outcome.suggested_action,
        intent: outcome.intent,
    }))
}

/// Resolve a pending confirmation.
///
/// Executes the pending action on `confirmed: true`; cancels it
/// otherwise. Expired confirmations return 410.
#[utoipa::path(
    post,
    path = "/ai/confirm",
    request_body = AiConfirmRequest,
    responses(
        (status = 200, description = "Confirmation handled", body = AiConfirmResponse),
        (status = 404, description = "Conversation not found", body = iris_core::error::ApiError),
        (status = 410, description = "Confirmation expired", body = iris_core::error::ApiError),
        (status = 503, description = "Conversation store unavailable", body = iris_core::error::ApiError)
    ),
    tag = "ai"
)]
pub async fn handle_confirm(
    State(state): State<AppState>,
    Json(request): Json<AiConfirmRequest>,
) -> Result<Json<AiConfirmResponse>, AppError> {
    tracing::info!(
        conversation_id = %request.conversation_id,
        tenant_id = %request.tenant_id,
        confirmed = request.confirmed,
        "ai confirm received"
    );

    let outcome = state
        .service
        .handle_confirm(Confirm {
            conversation_id: request.conversation_id,
            tenant_id: request.tenant_id,
            confirmed: request.confirmed,
        })
        .await?;

    Ok(Json(AiConfirmResponse {
        conversation_id: outcome.conversation_id,
        response: outcome.response,
        action_executed: outcome.action_executed,
        result: outcome.result,
    }))
}
