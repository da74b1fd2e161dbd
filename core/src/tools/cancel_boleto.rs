use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ports::{BillingUseCases, CancelBoletoRequest};
use crate::tools::{Tool, ToolResult};

/// Input for the boleto-cancellation tool.
#[derive(Debug, Clone)]
pub struct CancelBoletoToolInput {
    pub boleto_id: String,
    pub reason: Option<String>,
}

/// Cancels a boleto through the billing use case.
///
/// Preconditions: the user has confirmed; the boleto must exist and must
/// not already be paid or cancelled (enforced by the use case).
pub struct CancelBoletoTool {
    billing: Arc<dyn BillingUseCases>,
}

impl CancelBoletoTool {
    pub fn new(billing: Arc<dyn BillingUseCases>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl Tool for CancelBoletoTool {
    type Input = CancelBoletoToolInput;

    fn name(&self) -> &'static str {
        "cancel_boleto"
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn validate_input(&self, input: &Self::Input) -> Vec<String> {
        let mut errors = Vec::new();
        if input.boleto_id.is_empty() {
            errors.push("boleto_id is required".to_string());
        }
        errors
    }

    async fn execute(&self, input: Self::Input) -> ToolResult {
        let errors = self.validate_input(&input);
        if !errors.is_empty() {
            return ToolResult::fail(errors.join("; "));
        }

        tracing::info!(boleto_id = %input.boleto_id, "cancel boleto tool start");

        let request = CancelBoletoRequest {
            boleto_id: input.boleto_id,
            reason: input.reason,
        };

        match self.billing.cancel_boleto(request).await {
            Ok(boleto) => {
                tracing::info!(boleto_id = %boleto.id, "cancel boleto tool success");
                ToolResult::ok(json!({
                    "boleto_id": boleto.id,
                    "status": boleto.status.as_str(),
                }))
            }
            Err(error) => {
                tracing::error!(error = %error, "cancel boleto tool error");
                ToolResult::fail(error.to_string())
            }
        }
    }
}
