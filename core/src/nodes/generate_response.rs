use async_trait::async_trait;

use crate::messages::{MSG_OPERATION_DONE, format_brl, format_date_br};
use crate::pipeline::Node;
use crate::state::{ConversationState, Intent};

/// Formats the user-facing response from the tool result.
///
/// Purely deterministic: no model output, no branching safety logic.
/// A response set by an earlier node always wins.
pub struct GenerateResponse;

#[async_trait]
impl Node for GenerateResponse {
    fn name(&self) -> &'static str {
        "generate_response"
    }

    async fn run(&self, state: ConversationState) -> ConversationState {
        if state.response.is_some() {
            return state;
        }

        if let Some(error) = state.tool_error.as_deref() {
            let response = format!("Não foi possível completar a operação: {error}");
            return state.update().response(response).finish();
        }

        if state.tool_result.is_none() {
            return state.update().response(MSG_OPERATION_DONE).finish();
        }

        let response = format_result(&state);
        state.update().response(response).finish()
    }
}

fn format_result(state: &ConversationState) -> String {
    let empty = serde_json::json!({});
    let result = state.tool_result.as_ref().unwrap_or(&empty);

    match state.intent {
        Some(Intent::CreateBoleto) => {
            let amount = format_brl(result["amount_cents"].as_i64().unwrap_or(0));
            let boleto_id = result["boleto_id"].as_str().unwrap_or("");
            let due_date = format_date_br(result["due_date"].as_str().unwrap_or(""));
            format!(
                "✅ Boleto criado com sucesso!\n\n\
                 **Valor:** {amount}\n\
                 **Vencimento:** {due_date}\n\
                 **ID:** {boleto_id}\n\n\
                 O boleto será enviado ao contato."
            )
        }
        Some(Intent::CancelBoleto) => {
            let boleto_id = result["boleto_id"].as_str().unwrap_or("");
            format!("✅ Boleto **{boleto_id}** cancelado com sucesso.")
        }
        Some(Intent::CheckStatus) => {
            let boleto_id = result["boleto_id"].as_str().unwrap_or("");
            let status = result["status"].as_str().unwrap_or("desconhecido");
            format!(
                "📋 Status do boleto **{boleto_id}**: {}",
                status_label(status)
            )
        }
        Some(Intent::SendMessage) => "✅ Mensagem adicionada à fila de envio.".to_string(),
        Some(Intent::ListBoletos) => {
            let count = result["count"].as_u64().unwrap_or(0);
            if count == 0 {
                "📋 Você não tem boletos no momento.".to_string()
            } else {
                format!("📋 Você tem {count} boleto(s).")
            }
        }
        _ => MSG_OPERATION_DONE.to_string(),
    }
}

/// Human-readable label for a wire status value; unknown values pass
/// through unchanged.
fn status_label(status: &str) -> &str {
    match status {
        "created" => "Criado",
        "sent" => "Enviado",
        "paid" => "Pago",
        "overdue" => "Vencido",
        "cancelled" => "Cancelado",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InputKind;
    use serde_json::json;

    fn base_state() -> ConversationState {
        ConversationState::new("conv-1", Some("t1".into()), None, "x", InputKind::Text)
    }

    #[tokio::test]
    async fn earlier_response_wins() {
        let state = base_state().update().response("já respondido").finish();
        let out = GenerateResponse.run(state).await;
        assert_eq!(out.response.as_deref(), Some("já respondido"));
    }

    #[tokio::test]
    async fn tool_error_formats_failure_notice() {
        let state = base_state().update().tool_error("saldo insuficiente").finish();
        let out = GenerateResponse.run(state).await;
        assert_eq!(
            out.response.as_deref(),
            Some("Não foi possível completar a operação: saldo insuficiente")
        );
    }

    #[tokio::test]
    async fn no_tool_result_yields_generic_completion() {
        let out = GenerateResponse.run(base_state()).await;
        assert_eq!(out.response.as_deref(), Some(MSG_OPERATION_DONE));
    }

    #[tokio::test]
    async fn creation_result_contains_amount_date_and_id() {
        let state = base_state()
            .update()
            .intent(Intent::CreateBoleto)
            .tool_result(json!({
                "boleto_id": "b-42",
                "amount_cents": 15000,
                "due_date": "2026-03-10",
            }))
            .finish();
        let out = GenerateResponse.run(state).await;
        let response = out.response.as_deref().unwrap();
        assert!(response.contains("R$ 150,00"), "got: {response}");
        assert!(response.contains("10/03/2026"), "got: {response}");
        assert!(response.contains("b-42"), "got: {response}");
    }

    #[tokio::test]
    async fn status_result_maps_wire_status_to_label() {
        let state = base_state()
            .update()
            .intent(Intent::CheckStatus)
            .tool_result(json!({"boleto_id": "b-7", "status": "paid"}))
            .finish();
        let out = GenerateResponse.run(state).await;
        assert_eq!(
            out.response.as_deref(),
            Some("📋 Status do boleto **b-7**: Pago")
        );
    }

    #[tokio::test]
    async fn empty_listing_has_zero_special_case() {
        let state = base_state()
            .update()
            .intent(Intent::ListBoletos)
            .tool_result(json!({"boletos": [], "count": 0}))
            .finish();
        let out = GenerateResponse.run(state).await;
        assert_eq!(out.response.as_deref(), Some("📋 Você não tem boletos no momento."));

        let state = base_state()
            .update()
            .intent(Intent::ListBoletos)
            .tool_result(json!({"boletos": [{}, {}], "count": 2}))
            .finish();
        let out = GenerateResponse.run(state).await;
        assert_eq!(out.response.as_deref(), Some("📋 Você tem 2 boleto(s)."));
    }
}
