//! Language-understanding port.
//!
//! Implementations classify intent and extract entities, returning
//! structured fields only — never free prose. Failures are carried in
//! the result (`success = false` + error fields); the pipeline degrades
//! locally and never raises past a node boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::Intent;

pub mod stub;

pub use stub::StubLlmProvider;

/// Error classification from LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmErrorCode {
    InvalidInput,
    Timeout,
    RateLimited,
    ApiError,
    ParseError,
    Unknown,
}

/// Result from intent classification.
#[derive(Debug, Clone, Default)]
pub struct IntentClassification {
    pub success: bool,
    /// Wire value from the provider; mapped onto the closed
    /// [`Intent`] set by the classification node.
    pub intent: Option<String>,
    pub confidence: f64,
    pub error_code: Option<LlmErrorCode>,
    pub error_message: Option<String>,
}

impl IntentClassification {
    pub fn ok(intent: impl Into<String>, confidence: f64) -> Self {
        Self {
            success: true,
            intent: Some(intent.into()),
            confidence,
            ..Self::default()
        }
    }

    pub fn fail(code: LlmErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(code),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Result from entity extraction.
#[derive(Debug, Clone, Default)]
pub struct EntityExtraction {
    pub success: bool,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub amount_cents: Option<i64>,
    /// ISO date string (YYYY-MM-DD)
    pub due_date: Option<String>,
    pub boleto_id: Option<String>,
    pub message_content: Option<String>,
    pub error_code: Option<LlmErrorCode>,
    pub error_message: Option<String>,
}

impl EntityExtraction {
    pub fn fail(code: LlmErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(code),
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Port for language-understanding operations.
///
/// Timeouts and retries are the implementation's concern; callers only
/// see a structured result.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Classify normalized user text into one of the closed intent values.
    async fn classify_intent(&self, text: &str) -> IntentClassification;

    /// Extract structured entities from normalized text, scoped by intent
    /// (which fields are of interest differs per intent).
    async fn extract_entities(&self, text: &str, intent: Intent) -> EntityExtraction;
}
