use std::time::Duration;

use async_trait::async_trait;
use iris_core::llm::{EntityExtraction, IntentClassification, LlmErrorCode, LlmProvider};
use iris_core::state::Intent;
use serde_json::{Value, json};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const INTENT_CLASSIFICATION_PROMPT: &str = "\
You are an intent classifier for a financial billing assistant.
Classify the user message into ONE of these intents:
- create_boleto: User wants to create a new boleto/billing
- cancel_boleto: User wants to cancel an existing boleto
- check_status: User wants to check the status of a boleto
- send_message: User wants to send a message/reminder
- list_boletos: User wants to list their boletos
- general_question: User has a general question
- unknown: Cannot determine intent

Return ONLY a JSON object with this exact structure:
{\"intent\": \"<intent>\", \"confidence\": <0.0-1.0>}

User message: {text}";

const ENTITY_EXTRACTION_PROMPT: &str = "\
You are an entity extractor for a financial billing assistant.
Extract entities from the user message based on the intent: {intent}

For create_boleto, extract:
- contact_name: Name of the person to bill
- amount_cents: Amount in cents (e.g., \"R$ 100,00\" = 10000)
- due_date: Due date in YYYY-MM-DD format

For cancel_boleto or check_status, extract:
- boleto_id: The boleto identifier (UUID)

For send_message, extract:
- contact_name: Name of the recipient
- message_content: Message to send

Return ONLY a JSON object with extracted fields. Use null for missing fields.
Example: {\"contact_name\": \"João\", \"amount_cents\": 10000, \"due_date\": \"2026-02-15\"}

User message: {text}";

/// Gemini adapter for intent classification and entity extraction.
///
/// Structured JSON output only; timeouts and API failures are mapped to
/// error codes on the result — callers never see a transport error.
/// Message text is never logged.
pub struct GeminiLlmProvider {
    client: reqwest::Client,
    api_key: String,
    model_name: String,
}

impl GeminiLlmProvider {
    pub fn new(api_key: String, model_name: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            client,
            api_key,
            model_name,
        }
    }

    async fn call_gemini(&self, prompt: &str) -> Result<String, (LlmErrorCode, String)> {
        let url = format!(
            "{GEMINI_BASE_URL}/models/{}:generateContent",
            self.model_name
        );

        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": 0.1,
                "topP": 0.95,
                "maxOutputTokens": 256,
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    (LlmErrorCode::Timeout, "Request timed out".to_string())
                } else {
                    (LlmErrorCode::ApiError, e.to_string())
                }
            })?;

        if !response.status().is_success() {
            tracing::error!(status_code = %response.status(), "gemini api error");
            return Err((
                LlmErrorCode::ApiError,
                format!("Gemini returned status {}", response.status()),
            ));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| (LlmErrorCode::ParseError, e.to_string()))?;

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                (
                    LlmErrorCode::ApiError,
                    "Empty response from Gemini".to_string(),
                )
            })?;

        Ok(strip_markdown_fences(text).to_string())
    }
}

/// Gemini wraps JSON answers in markdown code fences often enough that
/// stripping them is part of the contract.
fn strip_markdown_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[async_trait]
impl LlmProvider for GeminiLlmProvider {
    async fn classify_intent(&self, text: &str) -> IntentClassification {
        let prompt = INTENT_CLASSIFICATION_PROMPT.replace("{text}", text);

        let raw = match self.call_gemini(&prompt).await {
            Ok(raw) => raw,
            Err((code, message)) => return IntentClassification::fail(code, message),
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "gemini classification parse error");
                return IntentClassification::fail(
                    LlmErrorCode::ParseError,
                    format!("Failed to parse response: {e}"),
                );
            }
        };

        let intent = parsed["intent"].as_str().unwrap_or("unknown").to_string();
        let confidence = parsed["confidence"].as_f64().unwrap_or(0.0);

        tracing::info!(intent = %intent, confidence, "gemini classification");

        IntentClassification::ok(intent, confidence)
    }

    async fn extract_entities(&self, text: &str, intent: Intent) -> EntityExtraction {
        let prompt = ENTITY_EXTRACTION_PROMPT
            .replace("{intent}", intent.as_str())
            .replace("{text}", text);

        let raw = match self.call_gemini(&prompt).await {
            Ok(raw) => raw,
            Err((code, message)) => return EntityExtraction::fail(code, message),
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "gemini extraction parse error");
                return EntityExtraction::fail(
                    LlmErrorCode::ParseError,
                    format!("Failed to parse response: {e}"),
                );
            }
        };

        let string_field =
            |key: &str| parsed[key].as_str().map(str::to_string);

        EntityExtraction {
            success: true,
            contact_name: string_field("contact_name"),
            contact_phone: string_field("contact_phone"),
            amount_cents: parsed["amount_cents"].as_i64(),
            due_date: string_field("due_date"),
            boleto_id: string_field("boleto_id"),
            message_content: string_field("message_content"),
            error_code: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(
            strip_markdown_fences("```json\n{\"intent\": \"unknown\"}\n```"),
            "{\"intent\": \"unknown\"}"
        );
        assert_eq!(strip_markdown_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_markdown_fences("```\n{}\n```"), "{}");
    }
}
