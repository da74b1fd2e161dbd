//! Use-case ports consumed by the tool boundary.
//!
//! The billing/contacts/messaging domain lives outside this crate; tools
//! reach it only through these narrow contracts. Implementations own
//! persistence, provider calls, retries and idempotency bookkeeping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a boleto as reported by the billing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoletoStatus {
    Created,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl BoletoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BoletoStatus::Created => "created",
            BoletoStatus::Sent => "sent",
            BoletoStatus::Paid => "paid",
            BoletoStatus::Overdue => "overdue",
            BoletoStatus::Cancelled => "cancelled",
        }
    }
}

/// A boleto as the use-case layer reports it back to the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoletoRecord {
    pub id: String,
    pub status: BoletoStatus,
    pub amount_cents: i64,
    /// ISO date string (YYYY-MM-DD)
    pub due_date: String,
    pub provider_reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateBoletoRequest {
    pub tenant_id: String,
    pub contact_name: String,
    pub amount_cents: i64,
    pub due_date: String,
    /// Caller-supplied token preventing duplicate creation across retries.
    pub idempotency_key: String,
}

#[derive(Debug, Clone)]
pub struct CancelBoletoRequest {
    pub boleto_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueueMessageRequest {
    pub tenant_id: String,
    pub contact_name: String,
    pub message_content: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub message_id: String,
}

/// Errors surfaced by the use-case layer. The tool boundary converts
/// these into a failed `ToolResult`; they never cross a node boundary.
#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("boleto não encontrado")]
    NotFound,
    #[error("{0}")]
    Rejected(String),
    #[error("falha no provedor: {0}")]
    Provider(String),
}

/// Billing operations the assistant may invoke.
#[async_trait]
pub trait BillingUseCases: Send + Sync {
    async fn create_boleto(&self, request: CreateBoletoRequest)
    -> Result<BoletoRecord, UseCaseError>;

    async fn cancel_boleto(&self, request: CancelBoletoRequest)
    -> Result<BoletoRecord, UseCaseError>;

    async fn get_boleto_status(&self, boleto_id: &str) -> Result<BoletoRecord, UseCaseError>;

    async fn list_boletos(&self, tenant_id: &str) -> Result<Vec<BoletoRecord>, UseCaseError>;
}

/// Messaging operations the assistant may invoke.
#[async_trait]
pub trait MessagingUseCases: Send + Sync {
    async fn queue_message(&self, request: QueueMessageRequest)
    -> Result<QueuedMessage, UseCaseError>;
}
