use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::messages::{
    MSG_AMOUNT_NOT_POSITIVE, MSG_AMOUNT_TOO_LARGE, MSG_DUE_DATE_IN_PAST, MSG_DUE_DATE_INVALID,
    join_with_conjunction,
};
use crate::pipeline::Node;
use crate::state::{ConversationState, Intent, ValidationResult};

/// Maximum accepted amount in minor currency units (R$ 100.000,00).
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000;

/// Machine field names required per intent. Listing and general
/// questions need nothing; `Unknown` never reaches execution anyway.
fn required_entities(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::CreateBoleto => &["contact_name", "amount_cents", "due_date"],
        Intent::CancelBoleto => &["boleto_id"],
        Intent::CheckStatus => &["boleto_id"],
        Intent::SendMessage => &["contact_name", "message_content"],
        Intent::ListBoletos | Intent::GeneralQuestion | Intent::Unknown => &[],
    }
}

/// Human-readable field names used in clarification messages.
fn field_display_name(field: &str) -> &'static str {
    match field {
        "contact_name" => "nome do contato",
        "contact_phone" => "telefone do contato",
        "amount_cents" => "valor",
        "due_date" => "data de vencimento",
        "boleto_id" => "ID do boleto",
        "message_content" => "conteúdo da mensagem",
        _ => "campo",
    }
}

/// Checks request completeness and value sanity before anything is
/// allowed near the confirmation gate.
///
/// Missing required fields halt with `Clarify`; invalid values halt
/// with `Fail`; otherwise the result is `Pass` and prior errors are
/// cleared.
pub struct ValidateRequest;

#[async_trait]
impl Node for ValidateRequest {
    fn name(&self) -> &'static str {
        "validate_request"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        let Some(intent) = state.intent else {
            return state;
        };
        if state.should_stop() {
            return state;
        }

        let missing: Vec<&'static str> = required_entities(intent)
            .iter()
            .copied()
            .filter(|field| !has_entity(&state, field))
            .collect();

        if !missing.is_empty() {
            let display_names: Vec<&str> =
                missing.iter().map(|field| field_display_name(field)).collect();
            let response = format!(
                "Para continuar, preciso saber: {}.",
                join_with_conjunction(&display_names)
            );

            tracing::info!(
                conversation_id = %state.conversation_id,
                missing = ?missing,
                "validation missing required fields"
            );

            return state
                .update()
                .validation_result(ValidationResult::Clarify)
                .validation_errors(missing.iter().map(|s| s.to_string()).collect())
                .response(response)
                .finish();
        }

        let errors = validate_values(&state);
        if !errors.is_empty() {
            tracing::info!(
                conversation_id = %state.conversation_id,
                error_count = errors.len(),
                "validation value errors"
            );
            let first = errors[0].clone();
            return state
                .update()
                .validation_result(ValidationResult::Fail)
                .validation_errors(errors)
                .response(first)
                .finish();
        }

        state
            .update()
            .validation_result(ValidationResult::Pass)
            .validation_errors(Vec::new())
            .finish()
    }
}

fn has_entity(state: &ConversationState, field: &str) -> bool {
    let entities = &state.entities;
    match field {
        "contact_name" => entities.contact_name.is_some(),
        "contact_phone" => entities.contact_phone.is_some(),
        "amount_cents" => entities.amount_cents.is_some(),
        "due_date" => entities.due_date.is_some(),
        "boleto_id" => entities.boleto_id.is_some(),
        "message_content" => entities.message_content.is_some(),
        _ => false,
    }
}

fn validate_values(state: &ConversationState) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(amount) = state.entities.amount_cents {
        if amount <= 0 {
            errors.push(MSG_AMOUNT_NOT_POSITIVE.to_string());
        } else if amount > MAX_AMOUNT_CENTS {
            errors.push(MSG_AMOUNT_TOO_LARGE.to_string());
        }
    }

    if let Some(due_date) = state.entities.due_date.as_deref() {
        match NaiveDate::parse_from_str(due_date, "%Y-%m-%d") {
            Ok(due) => {
                if due < Utc::now().date_naive() {
                    errors.push(MSG_DUE_DATE_IN_PAST.to_string());
                }
            }
            Err(_) => errors.push(MSG_DUE_DATE_INVALID.to_string()),
        }
    }

    errors
}
