use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use iris_core::llm::{LlmProvider, StubLlmProvider};
use iris_core::pipeline::Pipeline;
use iris_core::service::ConversationService;
use iris_core::tools::ToolRegistry;

mod config;
mod cors;
mod error;
mod providers;
mod routes;
mod state;
mod store;

use config::{LlmProviderKind, Settings};
use providers::billing_stub::{StubBillingUseCases, StubMessagingUseCases};
use providers::gemini::GeminiLlmProvider;
use store::RedisConversationStore;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "IRIS Billing Assistant API",
        version = "0.1.0",
        description = "Conversational billing assistant: free-form chat in, confirmed boleto actions out."
    ),
    paths(
        routes::health::health_check,
        routes::ai::handle_message,
        routes::ai::handle_confirm,
    ),
    components(schemas(
        HealthResponse,
        routes::ai::AiMessageRequest,
        routes::ai::AiMessageResponse,
        routes::ai::AiConfirmRequest,
        routes::ai::AiConfirmResponse,
        iris_core::error::ApiError,
        iris_core::state::Intent,
        iris_core::state::InputKind,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iris_api=debug,iris_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let settings = Settings::from_env();

    // Conversation store
    let redis_client =
        redis::Client::open(settings.redis_url.clone()).expect("Invalid IRIS_REDIS_URL");
    let redis_connection = redis::aio::ConnectionManager::new(redis_client)
        .await
        .expect("Failed to connect to Redis");
    let conversation_store = Arc::new(RedisConversationStore::new(redis_connection.clone()));

    // Language-understanding provider
    let llm: Arc<dyn LlmProvider> = match settings.llm_provider {
        LlmProviderKind::Gemini => {
            tracing::info!(model = %settings.gemini_model_name, "using Gemini LLM provider");
            Arc::new(GeminiLlmProvider::new(
                settings.gemini_api_key.clone(),
                settings.gemini_model_name.clone(),
                std::time::Duration::from_secs(settings.gemini_timeout_seconds),
            ))
        }
        LlmProviderKind::Stub => {
            tracing::info!("using stub LLM provider");
            Arc::new(StubLlmProvider)
        }
    };

    // Tool boundary over the (stubbed) domain use cases
    let tools = Arc::new(ToolRegistry::new(
        Arc::new(StubBillingUseCases::new()),
        Arc::new(StubMessagingUseCases),
    ));

    let pipeline = Pipeline::new(llm, tools);
    let service = Arc::new(ConversationService::new(
        pipeline,
        conversation_store,
        settings.ttls(),
    ));

    let app_state = state::AppState {
        service,
        redis: redis_connection,
    };

    let cors_layer = cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::ai::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("IRIS API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
