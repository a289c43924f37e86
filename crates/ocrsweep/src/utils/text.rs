//! Token and line normalization for detected text.

use crate::config::Vocabulary;

/// Symbol substitutions applied before overlay tokens are filtered.
const SYMBOL_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{2014}', "-"),
    ('\u{2013}', "-"),
    ('\u{2212}', "-"),
    ('\u{00D7}', "x"),
    ('\u{00F7}', "/"),
    ('\u{00B3}', "3"),
    ('\u{00B2}', "2"),
    ('\u{00B0}', ""),
];

const OVERLAY_TOKEN_MAX_CHARS: usize = 96;
const RESCUE_LINE_MAX_CHARS: usize = 120;

fn is_cyrillic_letter(c: char) -> bool {
    ('\u{0410}'..='\u{044F}').contains(&c)
}

/// Key used to decide whether two detected words are the same word:
/// Latin/Cyrillic letters and digits only, uppercased.
pub fn dedup_text_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || is_cyrillic_letter(*c))
        .flat_map(char::to_uppercase)
        .collect()
}

/// ASCII letters and digits only, uppercased.
pub fn compact_upper(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn is_overlay_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '.' | '/' | ':' | '_' | '+' | '\\' | '-' | '#' | '%' | '(' | ')')
}

/// Normalize a detected word for the invisible text layer.
///
/// Returns an empty string when nothing indexable survives.
pub fn normalize_overlay_token(text: &str, vocabulary: &Vocabulary) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut substituted = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match SYMBOL_SUBSTITUTIONS.iter().find(|(src, _)| *src == c) {
            Some((_, dst)) => substituted.push_str(dst),
            None => substituted.push(c),
        }
    }

    let cleaned: String = substituted
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| is_overlay_char(*c))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_alphanumeric()) {
        return String::new();
    }

    if let Some(phrase) = vocabulary.split_phrase(&compact_upper(&cleaned)) {
        return phrase.to_string();
    }
    cleaned.chars().take(OVERLAY_TOKEN_MAX_CHARS).collect()
}

fn is_rescue_line_char(c: char) -> bool {
    c.is_ascii_uppercase()
        || c.is_ascii_digit()
        || matches!(c, '.' | '/' | ':' | '%' | '(' | ')' | '-' | ' ' | '+')
}

/// Normalize one line of plain-text OCR output for the rescue layer.
pub fn normalize_rescue_line(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if upper.chars().count() < 4 {
        return String::new();
    }

    let collapsed = upper.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned: String = collapsed.chars().filter(|c| is_rescue_line_char(*c)).collect();
    if !cleaned.chars().any(|c| c.is_ascii_alphanumeric()) {
        return String::new();
    }
    cleaned.chars().take(RESCUE_LINE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_text_key() {
        assert_eq!(dedup_text_key("tag-101"), "TAG101");
        assert_eq!(dedup_text_key("Насос P-1"), "НАСОСP1");
        assert_eq!(dedup_text_key("--"), "");
    }

    #[test]
    fn test_overlay_token_symbols() {
        let vocab = Vocabulary::default();
        assert_eq!(normalize_overlay_token(" 25\u{00B0}C ", &vocab), "25C");
        assert_eq!(normalize_overlay_token("10\u{00D7}20", &vocab), "10x20");
        assert_eq!(normalize_overlay_token("P\u{2014}101", &vocab), "P-101");
        assert_eq!(normalize_overlay_token("m\u{00B3}/h", &vocab), "m3/h");
    }

    #[test]
    fn test_overlay_token_rejects_symbol_only() {
        let vocab = Vocabulary::default();
        assert_eq!(normalize_overlay_token("  ", &vocab), "");
        assert_eq!(normalize_overlay_token("--//", &vocab), "");
        assert_eq!(normalize_overlay_token("\u{00B0}", &vocab), "");
    }

    #[test]
    fn test_overlay_token_rejoins_split_phrase() {
        let vocab = Vocabulary::default();
        assert_eq!(normalize_overlay_token("JOINTEFFICIENCY:", &vocab), "JOINT EFFICIENCY");
        assert_eq!(normalize_overlay_token("Design-Code", &vocab), "DESIGN CODE");
    }

    #[test]
    fn test_overlay_token_truncates() {
        let vocab = Vocabulary::default();
        let long = "A".repeat(150);
        assert_eq!(normalize_overlay_token(&long, &vocab).len(), 96);
    }

    #[test]
    fn test_rescue_line() {
        assert_eq!(normalize_rescue_line("  design   temp: 120 °c "), "DESIGN TEMP: 120 C");
        assert_eq!(normalize_rescue_line("ab"), "");
        assert_eq!(normalize_rescue_line("----"), "");
        assert_eq!(normalize_rescue_line(&"x".repeat(200)).len(), 120);
    }
}
