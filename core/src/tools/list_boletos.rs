use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ports::BillingUseCases;
use crate::tools::{Tool, ToolResult};

/// Input for the listing tool.
#[derive(Debug, Clone)]
pub struct ListBoletosToolInput {
    pub tenant_id: String,
}

/// Lists the tenant's boletos. Read-only, no confirmation required.
pub struct ListBoletosTool {
    billing: Arc<dyn BillingUseCases>,
}

impl ListBoletosTool {
    pub fn new(billing: Arc<dyn BillingUseCases>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl Tool for ListBoletosTool {
    type Input = ListBoletosToolInput;

    fn name(&self) -> &'static str {
        "list_boletos"
    }

    fn requires_confirmation(&self) -> bool {
        false
    }

    fn validate_input(&self, input: &Self::Input) -> Vec<String> {
        let mut errors = Vec::new();
        if input.tenant_id.is_empty() {
            errors.push("tenant_id is required".to_string());
        }
        errors
    }

    async fn execute(&self, input: Self::Input) -> ToolResult {
        let errors = self.validate_input(&input);
        if !errors.is_empty() {
            return ToolResult::fail(errors.join("; "));
        }

        tracing::info!(tenant_id = %input.tenant_id, "list boletos tool start");

        match self.billing.list_boletos(&input.tenant_id).await {
            Ok(boletos) => {
                let count = boletos.len();
                let items: Vec<serde_json::Value> = boletos
                    .into_iter()
                    .map(|boleto| {
                        json!({
                            "boleto_id": boleto.id,
                            "status": boleto.status.as_str(),
                            "amount_cents": boleto.amount_cents,
                            "due_date": boleto.due_date,
                        })
                    })
                    .collect();
                ToolResult::ok(json!({ "boletos": items, "count": count }))
            }
            Err(error) => {
                tracing::error!(error = %error, "list boletos tool error");
                ToolResult::fail(error.to_string())
            }
        }
    }
}
