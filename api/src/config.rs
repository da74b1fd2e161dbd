use std::time::Duration;

use iris_core::service::StateTtls;

/// Which language-understanding provider to wire in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    Stub,
}

/// Application settings, loaded from `IRIS_`-prefixed environment
/// variables with typed defaults. `.env` is loaded by main (dev only).
#[derive(Clone, Debug)]
pub struct Settings {
    pub redis_url: String,
    pub state_ttl_seconds: u64,
    pub confirmation_ttl_seconds: u64,
    pub llm_provider: LlmProviderKind,
    pub gemini_api_key: String,
    pub gemini_model_name: String,
    pub gemini_timeout_seconds: u64,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Self {
        let gemini_api_key = env_or("IRIS_GEMINI_API_KEY", "");

        // Explicit selection wins; otherwise Gemini only when a key is
        // configured, so local development works out of the box.
        let llm_provider = match env_or("IRIS_LLM_PROVIDER", "").to_lowercase().as_str() {
            "gemini" => LlmProviderKind::Gemini,
            "stub" => LlmProviderKind::Stub,
            _ if !gemini_api_key.is_empty() => LlmProviderKind::Gemini,
            _ => LlmProviderKind::Stub,
        };

        Self {
            redis_url: env_or("IRIS_REDIS_URL", "redis://localhost:6379/0"),
            state_ttl_seconds: env_parse("IRIS_AI_STATE_TTL_SECONDS", 1800),
            confirmation_ttl_seconds: env_parse("IRIS_AI_CONFIRMATION_TTL_SECONDS", 300),
            llm_provider,
            gemini_api_key,
            gemini_model_name: env_or("IRIS_GEMINI_MODEL_NAME", "gemini-2.5-pro"),
            gemini_timeout_seconds: env_parse("IRIS_GEMINI_TIMEOUT_SECONDS", 30),
            port: env_parse("PORT", 8000),
        }
    }

    pub fn ttls(&self) -> StateTtls {
        StateTtls {
            state: Duration::from_secs(self.state_ttl_seconds),
            pending_confirmation: Duration::from_secs(self.confirmation_ttl_seconds),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
