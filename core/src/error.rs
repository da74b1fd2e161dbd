use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response returned by the HTTP surface.
/// Every error carries a machine-readable code plus enough context
/// for the caller to understand what went wrong and how to fix it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "confirmation_expired")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Conversation this error relates to (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const CONVERSATION_NOT_FOUND: &str = "conversation_not_found";
    pub const CONFIRMATION_EXPIRED: &str = "confirmation_expired";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
