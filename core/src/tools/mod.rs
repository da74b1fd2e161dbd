//! The tool boundary: the only path by which the pipeline can cause a
//! domain side effect.
//!
//! Contract:
//! - Tools call the use-case ports only; never a store, never a provider.
//! - Tools validate their own input shape independently of the upstream
//!   validation gate.
//! - Tools catch every use-case error into a [`ToolResult`]; nothing
//!   propagates past the execution node.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ports::{BillingUseCases, MessagingUseCases};

mod cancel_boleto;
mod create_boleto;
mod get_boleto_status;
mod list_boletos;
mod queue_message;

pub use cancel_boleto::{CancelBoletoTool, CancelBoletoToolInput};
pub use create_boleto::{CreateBoletoTool, CreateBoletoToolInput};
pub use get_boleto_status::{GetBoletoStatusTool, GetBoletoStatusToolInput};
pub use list_boletos::{ListBoletosTool, ListBoletosToolInput};
pub use queue_message::{QueueMessageTool, QueueMessageToolInput};

/// Two-variant outcome of a tool execution: success with data, or
/// failure with an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A narrow adapter wrapping exactly one domain use case.
#[async_trait]
pub trait Tool: Send + Sync {
    type Input;

    /// Tool name for logging and dispatch.
    fn name(&self) -> &'static str;

    /// Whether this tool requires explicit user confirmation.
    fn requires_confirmation(&self) -> bool;

    /// Validate input before execution. Empty list means valid.
    fn validate_input(&self, input: &Self::Input) -> Vec<String>;

    async fn execute(&self, input: Self::Input) -> ToolResult;
}

/// The fixed set of tools the pipeline can dispatch to, built once with
/// the injected use-case ports. Dispatch is a match on intent — there is
/// no runtime registration and no name-based lookup.
pub struct ToolRegistry {
    pub create_boleto: CreateBoletoTool,
    pub cancel_boleto: CancelBoletoTool,
    pub get_boleto_status: GetBoletoStatusTool,
    pub list_boletos: ListBoletosTool,
    pub queue_message: QueueMessageTool,
}

impl ToolRegistry {
    pub fn new(billing: Arc<dyn BillingUseCases>, messaging: Arc<dyn MessagingUseCases>) -> Self {
        Self {
            create_boleto: CreateBoletoTool::new(billing.clone()),
            cancel_boleto: CancelBoletoTool::new(billing.clone()),
            get_boleto_status: GetBoletoStatusTool::new(billing.clone()),
            list_boletos: ListBoletosTool::new(billing),
            queue_message: QueueMessageTool::new(messaging),
        }
    }
}
