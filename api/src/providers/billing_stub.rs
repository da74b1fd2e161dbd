//! In-memory stand-ins for the external billing/messaging domain.
//!
//! Predictable behavior without the payment provider: boletos live in a
//! process-local ledger, messages always queue. Used in development and
//! wherever the real use cases are not wired in.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use iris_core::ports::{
    BillingUseCases, BoletoRecord, BoletoStatus, CancelBoletoRequest, CreateBoletoRequest,
    MessagingUseCases, QueueMessageRequest, QueuedMessage, UseCaseError,
};
use uuid::Uuid;

#[derive(Default)]
pub struct StubBillingUseCases {
    boletos: Mutex<HashMap<String, BoletoRecord>>,
    /// Tenant ownership, for listing.
    tenants: Mutex<HashMap<String, String>>,
}

impl StubBillingUseCases {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillingUseCases for StubBillingUseCases {
    async fn create_boleto(
        &self,
        request: CreateBoletoRequest,
    ) -> Result<BoletoRecord, UseCaseError> {
        if request.amount_cents <= 0 {
            return Err(UseCaseError::Rejected("o valor precisa ser positivo".into()));
        }

        let id = Uuid::now_v7().to_string();
        let provider_reference = format!("paytime_{}", &Uuid::now_v7().simple().to_string()[..16]);

        let record = BoletoRecord {
            id: id.clone(),
            status: BoletoStatus::Created,
            amount_cents: request.amount_cents,
            due_date: request.due_date,
            provider_reference: Some(provider_reference),
        };

        self.boletos.lock().unwrap().insert(id.clone(), record.clone());
        self.tenants.lock().unwrap().insert(id, request.tenant_id);

        tracing::info!(amount_cents = record.amount_cents, "stub boleto created");
        Ok(record)
    }

    async fn cancel_boleto(
        &self,
        request: CancelBoletoRequest,
    ) -> Result<BoletoRecord, UseCaseError> {
        let mut boletos = self.boletos.lock().unwrap();
        let record = boletos
            .get_mut(&request.boleto_id)
            .ok_or(UseCaseError::NotFound)?;

        match record.status {
            BoletoStatus::Paid => {
                return Err(UseCaseError::Rejected("boleto já foi pago".into()));
            }
            BoletoStatus::Cancelled => {
                return Err(UseCaseError::Rejected("boleto já está cancelado".into()));
            }
            _ => {}
        }

        record.status = BoletoStatus::Cancelled;
        Ok(record.clone())
    }

    async fn get_boleto_status(&self, boleto_id: &str) -> Result<BoletoRecord, UseCaseError> {
        self.boletos
            .lock()
            .unwrap()
            .get(boleto_id)
            .cloned()
            .ok_or(UseCaseError::NotFound)
    }

    async fn list_boletos(&self, tenant_id: &str) -> Result<Vec<BoletoRecord>, UseCaseError> {
        let tenants = self.tenants.lock().unwrap();
        let boletos = self.boletos.lock().unwrap();
        Ok(boletos
            .values()
            .filter(|record| tenants.get(&record.id).map(String::as_str) == Some(tenant_id))
            .cloned()
            .collect())
    }
}

/// Always-succeeding message queue; delivery belongs to the workers.
pub struct StubMessagingUseCases;

#[async_trait]
impl MessagingUseCases for StubMessagingUseCases {
    async fn queue_message(
        &self,
        request: QueueMessageRequest,
    ) -> Result<QueuedMessage, UseCaseError> {
        tracing::info!(
            tenant_id = %request.tenant_id,
            content_length = request.message_content.len(),
            "stub message queued"
        );
        Ok(QueuedMessage {
            message_id: Uuid::now_v7().to_string(),
        })
    }
}
