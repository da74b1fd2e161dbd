//! Fixed user-facing pt-BR strings and formatting helpers.
//! Responses are deterministic — no model output ever reaches the user.

pub const MSG_EMPTY_INPUT: &str = "Não entendi sua mensagem. Pode repetir?";

pub const MSG_CLASSIFIER_FAILURE: &str =
    "Desculpe, tive um problema ao entender sua mensagem. Pode repetir?";

pub const MSG_INTENT_MENU: &str = "Não tenho certeza do que você quer fazer. Você pode:\n\
     - Criar um boleto\n\
     - Cancelar um boleto\n\
     - Ver status de um boleto\n\
     - Enviar uma mensagem\n\n\
     O que deseja?";

pub const MSG_AMOUNT_NOT_POSITIVE: &str = "O valor precisa ser positivo.";
pub const MSG_AMOUNT_TOO_LARGE: &str = "O valor máximo permitido é R$ 100.000,00.";
pub const MSG_DUE_DATE_IN_PAST: &str = "A data de vencimento não pode ser no passado.";
pub const MSG_DUE_DATE_INVALID: &str = "Data de vencimento inválida. Use o formato DD/MM/AAAA.";

pub const MSG_OPERATION_CANCELLED: &str = "Operação cancelada.";
pub const MSG_OPERATION_DONE: &str = "Operação concluída.";
pub const MSG_FALLBACK: &str = "Não consegui processar sua mensagem.";

pub const MSG_CONFIRMATION_EXPIRED: &str = "Confirmação expirada. Por favor, tente novamente.";
pub const MSG_CONVERSATION_NOT_FOUND: &str = "Conversa não encontrada.";

/// Format minor currency units as Brazilian Real: 1234567 → "R$ 12.345,67".
pub fn format_brl(amount_cents: i64) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let cents = amount_cents.abs();
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("R$ {sign}{grouped},{frac:02}")
}

/// Reformat an ISO date (YYYY-MM-DD) as DD/MM/YYYY for display.
/// Anything that is not three dash-separated parts is returned as-is.
pub fn format_date_br(iso_date: &str) -> String {
    let parts: Vec<&str> = iso_date.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => format!("{day}/{month}/{year}"),
        _ => iso_date.to_string(),
    }
}

/// Join human-readable field names with the locale conjunction:
/// ["valor"] → "valor"; ["valor", "data"] → "valor e data".
pub fn join_with_conjunction(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [rest @ .., last] => format!("{} e {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_brl_groups_thousands_and_uses_comma_decimals() {
        assert_eq!(format_brl(15000), "R$ 150,00");
        assert_eq!(format_brl(1234567), "R$ 12.345,67");
        assert_eq!(format_brl(10_000_000), "R$ 100.000,00");
        assert_eq!(format_brl(5), "R$ 0,05");
    }

    #[test]
    fn format_date_br_flips_iso_dates() {
        assert_eq!(format_date_br("2026-03-10"), "10/03/2026");
        assert_eq!(format_date_br("amanhã"), "amanhã");
    }

    #[test]
    fn join_with_conjunction_matches_locale() {
        assert_eq!(join_with_conjunction(&["valor"]), "valor");
        assert_eq!(
            join_with_conjunction(&["nome do contato", "valor", "data de vencimento"]),
            "nome do contato, valor e data de vencimento"
        );
    }
}
