use std::sync::Arc;

use iris_core::service::ConversationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConversationService>,
    /// Shared connection for health checks.
    pub redis: redis::aio::ConnectionManager,
}
