//! Keyword/regex language-understanding provider.
//!
//! Predictable, offline classification and extraction for development
//! and tests. No network calls.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{Datelike, Duration, Utc};
use regex::Regex;

use crate::llm::{EntityExtraction, IntentClassification, LlmProvider};
use crate::state::Intent;

const CREATE_KEYWORDS: &[&str] = &["criar", "gerar", "emitir", "novo boleto", "cobrar"];
const CANCEL_KEYWORDS: &[&str] = &["cancelar", "anular", "cancelamento"];
const STATUS_KEYWORDS: &[&str] = &["status", "situação", "como está", "verificar", "checar"];
const SEND_KEYWORDS: &[&str] = &["enviar", "mandar", "mensagem", "lembrete"];
const LIST_KEYWORDS: &[&str] = &["listar", "mostrar", "quais boletos", "meus boletos"];

static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)r\$\s*([\d.,]+)").unwrap(),
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:reais|real)").unwrap(),
        Regex::new(r"(?i)valor\s*(?:de)?\s*r?\$?\s*([\d.,]+)").unwrap(),
    ]
});

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{2,4}))?").unwrap());

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?55\s?)?(?:\(?\d{2}\)?\s?)?\d{4,5}[\s\-]?\d{4}").unwrap()
});

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:para|cliente)\s+([A-Za-zÀ-ú]{2,}(?:\s+[A-Za-zÀ-ú]{2,})?)").unwrap()
});

/// Tokens that trail a name in common phrasings ("para maria venc 10/03")
/// and must not be mistaken for a surname.
const NAME_STOPWORDS: &[&str] = &["venc", "vencimento", "dia", "hoje", "amanha", "amanhã", "valor"];

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

/// Stub LLM provider for testing and development.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubLlmProvider;

#[async_trait]
impl LlmProvider for StubLlmProvider {
    async fn classify_intent(&self, text: &str) -> IntentClassification {
        tracing::debug!(text_length = text.len(), "stub classify intent");

        let text_lower = text.to_lowercase();
        let contains_any = |keywords: &[&str]| keywords.iter().any(|kw| text_lower.contains(kw));

        if contains_any(CREATE_KEYWORDS) {
            return IntentClassification::ok("create_boleto", 0.85);
        }
        if contains_any(CANCEL_KEYWORDS) {
            return IntentClassification::ok("cancel_boleto", 0.85);
        }
        if contains_any(STATUS_KEYWORDS) {
            return IntentClassification::ok("check_status", 0.85);
        }
        if contains_any(SEND_KEYWORDS) {
            return IntentClassification::ok("send_message", 0.80);
        }
        if contains_any(LIST_KEYWORDS) {
            return IntentClassification::ok("list_boletos", 0.80);
        }

        IntentClassification::ok("unknown", 0.3)
    }

    async fn extract_entities(&self, text: &str, intent: Intent) -> EntityExtraction {
        tracing::debug!(intent = intent.as_str(), "stub extract entities");

        EntityExtraction {
            success: true,
            contact_name: extract_name(text),
            contact_phone: extract_phone(text),
            amount_cents: extract_amount_cents(text),
            due_date: extract_due_date(text),
            boleto_id: extract_boleto_id(text),
            message_content: None,
            error_code: None,
            error_message: None,
        }
    }
}

fn extract_amount_cents(text: &str) -> Option<i64> {
    for pattern in AMOUNT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            let raw = captures.get(1)?.as_str().replace('.', "").replace(',', ".");
            return raw.parse::<f64>().ok().map(|value| (value * 100.0) as i64);
        }
    }
    None
}

fn extract_due_date(text: &str) -> Option<String> {
    let text_lower = text.to_lowercase();
    let today = Utc::now().date_naive();

    if text_lower.contains("amanhã") || text_lower.contains("amanha") {
        return Some((today + Duration::days(1)).format("%Y-%m-%d").to_string());
    }
    if text_lower.contains("hoje") {
        return Some(today.format("%Y-%m-%d").to_string());
    }

    let captures = DATE_PATTERN.captures(text)?;
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month: u32 = captures.get(2)?.as_str().parse().ok()?;
    let mut year: i32 = match captures.get(3) {
        Some(value) => value.as_str().parse().ok()?,
        None => today.year(),
    };
    if year < 100 {
        year += 2000;
    }

    Some(format!("{year:04}-{month:02}-{day:02}"))
}

fn extract_phone(text: &str) -> Option<String> {
    let matched = PHONE_PATTERN.find(text)?;
    let digits: String = matched.as_str().chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= 10).then_some(digits)
}

fn extract_name(text: &str) -> Option<String> {
    let captures = NAME_PATTERN.captures(text)?;
    let words: Vec<&str> = captures
        .get(1)?
        .as_str()
        .split_whitespace()
        .take_while(|word| !NAME_STOPWORDS.contains(&word.to_lowercase().as_str()))
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(title_case(&words.join(" ")))
}

fn extract_boleto_id(text: &str) -> Option<String> {
    UUID_PATTERN.find(text).map(|m| m.as_str().to_lowercase())
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classifies_creation_phrases() {
        let result = StubLlmProvider
            .classify_intent("quero criar um boleto de r$ 150,00 para maria")
            .await;
        assert!(result.success);
        assert_eq!(result.intent.as_deref(), Some("create_boleto"));
        assert!(result.confidence >= 0.85);
    }

    #[tokio::test]
    async fn falls_back_to_unknown_with_low_confidence() {
        let result = StubLlmProvider.classify_intent("bom dia").await;
        assert_eq!(result.intent.as_deref(), Some("unknown"));
        assert!(result.confidence < 0.7);
    }

    #[tokio::test]
    async fn extracts_amount_name_and_date() {
        let result = StubLlmProvider
            .extract_entities(
                "quero criar um boleto de r$ 150,00 para maria venc 10/03/2026",
                Intent::CreateBoleto,
            )
            .await;
        assert!(result.success);
        assert_eq!(result.amount_cents, Some(15000));
        assert_eq!(result.contact_name.as_deref(), Some("Maria"));
        assert_eq!(result.due_date.as_deref(), Some("2026-03-10"));
    }

    #[tokio::test]
    async fn extracts_uuid_boleto_ids() {
        let result = StubLlmProvider
            .extract_entities(
                "cancelar o boleto 4db3b38a-9d97-4a39-a83e-6ad5a7f1f0d4",
                Intent::CancelBoleto,
            )
            .await;
        assert_eq!(
            result.boleto_id.as_deref(),
            Some("4db3b38a-9d97-4a39-a83e-6ad5a7f1f0d4")
        );
    }

    #[tokio::test]
    async fn extracts_grouped_thousands_amounts() {
        let result = StubLlmProvider
            .extract_entities("boleto de R$ 1.234,56 para joão", Intent::CreateBoleto)
            .await;
        assert_eq!(result.amount_cents, Some(123456));
        assert_eq!(result.contact_name.as_deref(), Some("João"));
    }
}
