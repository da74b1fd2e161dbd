use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::ports::{MessagingUseCases, QueueMessageRequest};
use crate::tools::{Tool, ToolResult};

/// Input for the message-queueing tool.
#[derive(Debug, Clone)]
pub struct QueueMessageToolInput {
    pub tenant_id: String,
    pub contact_name: String,
    pub message_content: String,
    pub idempotency_key: String,
}

/// Queues an outbound message for delivery by the messaging workers.
/// Non-monetary: no confirmation required. Opt-out and contact checks
/// belong to the wrapped use case.
pub struct QueueMessageTool {
    messaging: Arc<dyn MessagingUseCases>,
}

impl QueueMessageTool {
    pub fn new(messaging: Arc<dyn MessagingUseCases>) -> Self {
        Self { messaging }
    }
}

#[async_trait]
impl Tool for QueueMessageTool {
    type Input = QueueMessageToolInput;

    fn name(&self) -> &'static str {
        "queue_message"
    }

    fn requires_confirmation(&self) -> bool {
        false
    }

    fn validate_input(&self, input: &Self::Input) -> Vec<String> {
        let mut errors = Vec::new();
        if input.tenant_id.is_empty() {
            errors.push("tenant_id is required".to_string());
        }
        if input.contact_name.is_empty() {
            errors.push("contact_name is required".to_string());
        }
        if input.message_content.is_empty() {
            errors.push("message_content is required".to_string());
        }
        if input.idempotency_key.is_empty() {
            errors.push("idempotency_key is required".to_string());
        }
        errors
    }

    async fn execute(&self, input: Self::Input) -> ToolResult {
        let errors = self.validate_input(&input);
        if !errors.is_empty() {
            return ToolResult::fail(errors.join("; "));
        }

        tracing::info!(tenant_id = %input.tenant_id, "queue message tool start");

        let request = QueueMessageRequest {
            tenant_id: input.tenant_id,
            contact_name: input.contact_name,
            message_content: input.message_content,
            idempotency_key: input.idempotency_key,
        };

        match self.messaging.queue_message(request).await {
            Ok(queued) => ToolResult::ok(json!({
                "message_id": queued.message_id,
                "status": "queued",
            })),
            Err(error) => {
                tracing::error!(error = %error, "queue message tool error");
                ToolResult::fail(error.to_string())
            }
        }
    }
}
