//! Tier 1: static ordered pattern-correction rules for common OCR
//! substitution errors. Applied greedily — each rule that changes the
//! text produces a [`Correction`] and feeds the next rule its output.

use super::{LowConfidenceWord, ValidationResult};

pub const PATTERN_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub pattern_id: String,
    pub confidence: f64,
}

struct Rule {
    id: &'static str,
    apply: fn(&str) -> Option<String>,
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

fn looks_like_currency(s: &str) -> bool {
    s.contains('₹') || s.contains('$') || s.to_lowercase().starts_with("rs")
}

fn fix_zero_in_numeric(word: &str) -> Option<String> {
    if !has_digit(word) || !word.contains(['O', 'o']) {
        return None;
    }
    let fixed: String = word.chars().map(|c| if c == 'O' || c == 'o' { '0' } else { c }).collect();
    (fixed != word).then_some(fixed)
}

fn fix_one_in_numeric(word: &str) -> Option<String> {
    if !has_digit(word) || !word.contains(['l', 'I']) {
        return None;
    }
    let fixed: String = word.chars().map(|c| if c == 'l' || c == 'I' { '1' } else { c }).collect();
    (fixed != word).then_some(fixed)
}

fn fix_five_in_currency(word: &str) -> Option<String> {
    if !has_digit(word) || !looks_like_currency(word) || !word.contains(['S', 's']) {
        return None;
    }
    let fixed: String = word.chars().map(|c| if c == 'S' || c == 's' { '5' } else { c }).collect();
    (fixed != word).then_some(fixed)
}

fn fix_eight_in_numeric(word: &str) -> Option<String> {
    if !has_digit(word) || !word.contains(['B', 'b']) {
        return None;
    }
    let fixed: String = word.chars().map(|c| if c == 'B' || c == 'b' { '8' } else { c }).collect();
    (fixed != word).then_some(fixed)
}

/// Collapses stray whitespace inside digit-grouping separators, e.g.
/// "1, 000" -> "1,000", "Rs. 1 00" -> "Rs. 100" (date/currency
/// normalization).
fn normalize_separators(word: &str) -> Option<String> {
    if !has_digit(word) {
        return None;
    }
    let mut fixed = String::with_capacity(word.len());
    let chars: Vec<char> = word.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if (c == ',' || c == '.' || c == '/') && i + 1 < chars.len() && chars[i + 1] == ' ' {
            fixed.push(c);
            i += 2;
            continue;
        }
        fixed.push(c);
        i += 1;
    }
    (fixed != word).then_some(fixed)
}

fn rules() -> [Rule; 5] {
    [
        Rule { id: "zero_in_numeric", apply: fix_zero_in_numeric },
        Rule { id: "one_in_numeric", apply: fix_one_in_numeric },
        Rule { id: "five_in_currency", apply: fix_five_in_currency },
        Rule { id: "eight_in_numeric", apply: fix_eight_in_numeric },
        Rule { id: "normalize_separators", apply: normalize_separators },
    ]
}

/// Applies the ordered rule set to one word, returning the corrected
/// [`ValidationResult`] plus the individual rule applications that fired.
pub fn apply(word: &LowConfidenceWord) -> (ValidationResult, Vec<Correction>) {
    let mut current = word.text.clone();
    let mut corrections = Vec::new();

    for rule in rules() {
        if let Some(next) = (rule.apply)(&current) {
            corrections.push(Correction {
                original: current.clone(),
                corrected: next.clone(),
                pattern_id: rule.id.to_string(),
                confidence: PATTERN_CONFIDENCE,
            });
            current = next;
        }
    }

    let was_corrected = current != word.text;
    let result = ValidationResult {
        bbox_id: word.bbox_id,
        original: word.text.clone(),
        corrected: current.clone(),
        old_confidence: word.confidence,
        new_confidence: if was_corrected { PATTERN_CONFIDENCE } else { word.confidence },
        correction_type: was_corrected.then_some(super::CorrectionType::Pattern),
        reasoning: None,
        was_corrected,
    };
    (result, corrections)
}
