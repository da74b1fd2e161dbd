use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of user intents. The classifier can only land on these;
/// anything outside the set maps to `Unknown`, which triggers the
/// clarification flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateBoleto,
    CancelBoleto,
    CheckStatus,
    SendMessage,
    ListBoletos,
    GeneralQuestion,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::CreateBoleto => "create_boleto",
            Intent::CancelBoleto => "cancel_boleto",
            Intent::CheckStatus => "check_status",
            Intent::SendMessage => "send_message",
            Intent::ListBoletos => "list_boletos",
            Intent::GeneralQuestion => "general_question",
            Intent::Unknown => "unknown",
        }
    }

    /// Map a classifier wire value onto the closed set.
    /// Anything unrecognized becomes `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "create_boleto" => Intent::CreateBoleto,
            "cancel_boleto" => Intent::CancelBoleto,
            "check_status" => Intent::CheckStatus,
            "send_message" => Intent::SendMessage,
            "list_boletos" => Intent::ListBoletos,
            "general_question" => Intent::GeneralQuestion,
            _ => Intent::Unknown,
        }
    }

    /// Whether this intent moves money and therefore needs an explicit
    /// user confirmation round-trip before any tool executes.
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Intent::CreateBoleto | Intent::CancelBoleto)
    }
}

/// Validation gate results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    Pass,
    #[default]
    Fail,
    Clarify,
}

/// Confirmation gate status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Rejected,
    #[default]
    NotRequired,
}

/// How the user input arrived. Audio is accepted as a typed field;
/// transcription is a future extension and is not performed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Audio,
}

/// Entities extracted from user input.
/// All fields are optional — the validation gate checks required ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedEntities {
    pub contact_name: Option<String>,
    /// E.164 phone number
    pub contact_phone: Option<String>,
    /// Amount in integer minor currency units (centavos)
    pub amount_cents: Option<i64>,
    /// ISO date string (YYYY-MM-DD)
    pub due_date: Option<String>,
    pub boleto_id: Option<String>,
    pub message_content: Option<String>,
    /// Opaque provenance bag (e.g. which extractor produced the values)
    #[serde(default)]
    #[schema(value_type = Object)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

/// State that flows through the orchestration pipeline.
///
/// Never mutated in place: each node derives a new value through
/// [`ConversationState::update`], which bumps the step counter by one.
/// Persisted between turns as a flat JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    // Identifiers
    pub conversation_id: String,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,

    // Input
    pub user_input: String,
    #[serde(default)]
    pub input_kind: InputKind,
    pub normalized_input: Option<String>,

    // Intent classification
    pub intent: Option<Intent>,
    #[serde(default)]
    pub intent_confidence: f64,

    // Entity extraction
    #[serde(default)]
    pub entities: ExtractedEntities,

    // Validation
    #[serde(default)]
    pub validation_result: ValidationResult,
    #[serde(default)]
    pub validation_errors: Vec<String>,

    // Confirmation
    #[serde(default)]
    pub confirmation_status: ConfirmationStatus,
    pub confirmation_message: Option<String>,

    // Execution
    pub tool_name: Option<String>,
    pub tool_result: Option<serde_json::Value>,
    pub tool_error: Option<String>,

    // Response
    pub response: Option<String>,

    // Metadata
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub step_count: u32,
    pub correlation_id: Option<String>,
}

impl ConversationState {
    pub fn new(
        conversation_id: impl Into<String>,
        tenant_id: Option<String>,
        user_id: Option<String>,
        user_input: impl Into<String>,
        input_kind: InputKind,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            tenant_id,
            user_id,
            user_input: user_input.into(),
            input_kind,
            normalized_input: None,
            intent: None,
            intent_confidence: 0.0,
            entities: ExtractedEntities::default(),
            validation_result: ValidationResult::Fail,
            validation_errors: Vec::new(),
            confirmation_status: ConfirmationStatus::NotRequired,
            confirmation_message: None,
            tool_name: None,
            tool_result: None,
            tool_error: None,
            response: None,
            created_at: Utc::now(),
            step_count: 0,
            correlation_id: None,
        }
    }

    /// Begin a copy-with-overrides update. The returned builder owns a
    /// fresh copy with `step_count` already incremented by exactly one;
    /// the original value is left untouched.
    pub fn update(&self) -> StateUpdate {
        let mut next = self.clone();
        next.step_count += 1;
        StateUpdate { next }
    }

    /// Stop predicate checked by the engine after every node.
    pub fn should_stop(&self) -> bool {
        self.response.is_some()
            || self.tool_error.is_some()
            || self.confirmation_status == ConfirmationStatus::Rejected
    }
}

/// Builder for the immutable copy-with-overrides pattern.
/// Each setter overrides one field on the new value.
#[must_use = "finish() returns the updated state"]
pub struct StateUpdate {
    next: ConversationState,
}

impl StateUpdate {
    pub fn user_input(mut self, value: impl Into<String>) -> Self {
        self.next.user_input = value.into();
        self
    }

    pub fn normalized_input(mut self, value: Option<String>) -> Self {
        self.next.normalized_input = value;
        self
    }

    pub fn intent(mut self, value: Intent) -> Self {
        self.next.intent = Some(value);
        self
    }

    pub fn intent_confidence(mut self, value: f64) -> Self {
        self.next.intent_confidence = value;
        self
    }

    pub fn entities(mut self, value: ExtractedEntities) -> Self {
        self.next.entities = value;
        self
    }

    pub fn validation_result(mut self, value: ValidationResult) -> Self {
        self.next.validation_result = value;
        self
    }

    pub fn validation_errors(mut self, value: Vec<String>) -> Self {
        self.next.validation_errors = value;
        self
    }

    pub fn confirmation_status(mut self, value: ConfirmationStatus) -> Self {
        self.next.confirmation_status = value;
        self
    }

    pub fn confirmation_message(mut self, value: impl Into<String>) -> Self {
        self.next.confirmation_message = Some(value.into());
        self
    }

    pub fn tool_name(mut self, value: impl Into<String>) -> Self {
        self.next.tool_name = Some(value.into());
        self
    }

    pub fn tool_result(mut self, value: serde_json::Value) -> Self {
        self.next.tool_result = Some(value);
        self
    }

    pub fn tool_error(mut self, value: impl Into<String>) -> Self {
        self.next.tool_error = Some(value.into());
        self
    }

    pub fn response(mut self, value: impl Into<String>) -> Self {
        self.next.response = Some(value.into());
        self
    }

    pub fn clear_response(mut self) -> Self {
        self.next.response = None;
        self
    }

    /// Reset the per-turn execution outcome before re-running the pipeline.
    pub fn clear_tool_outcome(mut self) -> Self {
        self.next.tool_name = None;
        self.next.tool_result = None;
        self.next.tool_error = None;
        self
    }

    pub fn correlation_id(mut self, value: impl Into<String>) -> Self {
        self.next.correlation_id = Some(value.into());
        self
    }

    pub fn finish(self) -> ConversationState {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConversationState {
        ConversationState::new("conv-1", Some("tenant-1".into()), None, "oi", InputKind::Text)
    }

    #[test]
    fn requires_confirmation_only_for_monetary_intents() {
        assert!(Intent::CreateBoleto.requires_confirmation());
        assert!(Intent::CancelBoleto.requires_confirmation());
        assert!(!Intent::CheckStatus.requires_confirmation());
        assert!(!Intent::SendMessage.requires_confirmation());
        assert!(!Intent::ListBoletos.requires_confirmation());
        assert!(!Intent::GeneralQuestion.requires_confirmation());
        assert!(!Intent::Unknown.requires_confirmation());
    }

    #[test]
    fn from_wire_maps_outside_values_to_unknown() {
        assert_eq!(Intent::from_wire("create_boleto"), Intent::CreateBoleto);
        assert_eq!(Intent::from_wire("CREATE_BOLETO"), Intent::CreateBoleto);
        assert_eq!(Intent::from_wire("transfer_pix"), Intent::Unknown);
        assert_eq!(Intent::from_wire(""), Intent::Unknown);
    }

    #[test]
    fn update_increments_step_count_by_exactly_one() {
        let s0 = state();
        let s1 = s0.update().intent(Intent::ListBoletos).finish();
        let s2 = s1.update().finish();
        assert_eq!(s0.step_count, 0);
        assert_eq!(s1.step_count, 1);
        assert_eq!(s2.step_count, 2);
        assert_eq!(s1.intent, Some(Intent::ListBoletos));
        assert_eq!(s0.intent, None);
    }

    #[test]
    fn update_does_not_alias_the_entity_bag() {
        let s0 = state();
        let mut entities = ExtractedEntities::default();
        entities.contact_name = Some("Maria".into());
        let s1 = s0.update().entities(entities).finish();
        assert!(s0.entities.contact_name.is_none());
        assert_eq!(s1.entities.contact_name.as_deref(), Some("Maria"));
    }

    #[test]
    fn should_stop_on_response_tool_error_or_rejection_only() {
        let base = state();
        assert!(!base.should_stop());

        let with_response = base.update().response("ok").finish();
        assert!(with_response.should_stop());

        let with_error = base.update().tool_error("boom").finish();
        assert!(with_error.should_stop());

        let rejected = base
            .update()
            .confirmation_status(ConfirmationStatus::Rejected)
            .finish();
        assert!(rejected.should_stop());

        let pending = base
            .update()
            .confirmation_status(ConfirmationStatus::Pending)
            .finish();
        assert!(!pending.should_stop());

        let confirmed = base
            .update()
            .confirmation_status(ConfirmationStatus::Confirmed)
            .finish();
        assert!(!confirmed.should_stop());
    }

    #[test]
    fn state_round_trips_through_flat_json() {
        let s = state()
            .update()
            .intent(Intent::CreateBoleto)
            .intent_confidence(0.85)
            .confirmation_status(ConfirmationStatus::Pending)
            .finish();
        let doc = serde_json::to_string(&s).unwrap();
        assert!(doc.contains("\"create_boleto\""));
        assert!(doc.contains("\"pending\""));
        let back: ConversationState = serde_json::from_str(&doc).unwrap();
        assert_eq!(back.intent, Some(Intent::CreateBoleto));
        assert_eq!(back.step_count, s.step_count);
        assert_eq!(back.confirmation_status, ConfirmationStatus::Pending);
    }
}
