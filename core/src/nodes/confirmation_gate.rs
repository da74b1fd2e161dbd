use async_trait::async_trait;

use crate::messages::{MSG_OPERATION_CANCELLED, format_brl, format_date_br};
use crate::pipeline::Node;
use crate::state::{ConfirmationStatus, ConversationState, Intent, ValidationResult};

/// Keywords that cancel a pending monetary action in the same message.
const REJECTION_KEYWORDS: &[&str] = &["não", "nao", "cancela", "cancelar", "pare"];

/// The non-bypassable gate in front of monetary tools.
///
/// Arms a `Pending` confirmation (halting the turn with the prompt) for
/// intents that move money; passes non-monetary intents through as
/// `NotRequired`. A status already granted as `Confirmed` by the confirm
/// round-trip passes through untouched — the gate never re-arms it.
pub struct ConfirmationGate;

#[async_trait]
impl Node for ConfirmationGate {
    fn name(&self) -> &'static str {
        "confirmation_gate"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        if state.validation_result != ValidationResult::Pass {
            return state;
        }
        if state.should_stop() {
            return state;
        }
        let Some(intent) = state.intent else {
            return state;
        };

        if !intent.requires_confirmation() {
            tracing::info!(
                conversation_id = %state.conversation_id,
                intent = intent.as_str(),
                "confirmation not required"
            );
            return state
                .update()
                .confirmation_status(ConfirmationStatus::NotRequired)
                .finish();
        }

        if state.confirmation_status == ConfirmationStatus::Confirmed {
            return state;
        }

        let normalized = state.normalized_input.clone().unwrap_or_default();

        if REJECTION_KEYWORDS.iter().any(|kw| normalized.contains(kw)) {
            tracing::info!(
                conversation_id = %state.conversation_id,
                "confirmation rejected in message"
            );
            return state
                .update()
                .confirmation_status(ConfirmationStatus::Rejected)
                .response(MSG_OPERATION_CANCELLED)
                .finish();
        }

        // An affirmation inside the triggering message never grants
        // confirmation; only the explicit confirm round-trip does.
        let prompt = confirmation_prompt(&state, intent);

        tracing::info!(
            conversation_id = %state.conversation_id,
            intent = intent.as_str(),
            "confirmation pending"
        );

        state
            .update()
            .confirmation_status(ConfirmationStatus::Pending)
            .confirmation_message(prompt.clone())
            .response(prompt)
            .finish()
    }
}

fn confirmation_prompt(state: &ConversationState, intent: Intent) -> String {
    match intent {
        Intent::CreateBoleto => {
            let amount = format_brl(state.entities.amount_cents.unwrap_or(0));
            let contact = state.entities.contact_name.as_deref().unwrap_or("contato");
            let due_date = state
                .entities
                .due_date
                .as_deref()
                .map(format_date_br)
                .unwrap_or_else(|| "data não especificada".to_string());
            format!(
                "Vou criar um boleto de **{amount}** para **{contact}**, \
                 com vencimento em **{due_date}**.\n\nConfirma? (Sim/Não)"
            )
        }
        Intent::CancelBoleto => {
            let boleto_id = state
                .entities
                .boleto_id
                .as_deref()
                .unwrap_or("ID não especificado");
            format!("Vou cancelar o boleto **{boleto_id}**.\n\nConfirma? (Sim/Não)")
        }
        _ => "Confirma a operação? (Sim/Não)".to_string(),
    }
}
