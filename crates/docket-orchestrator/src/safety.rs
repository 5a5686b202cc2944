//! Safety guard and language policing (C12). Pre-LLM pattern guard blocks
//! queries asking for legal advice, outcome predictions, or liability
//! conclusions; post-LLM policing deterministically softens generated
//! answers that slip through phrasing the guard wasn't meant to catch
//! (it only ever inspects the *query*, never the model's own output).

use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use serde::Serialize;

use docket_core::config::SafetyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    LegalAdviceRequest,
    OutcomePrediction,
    LiabilityConclusion,
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetyCheck {
    pub is_safe: bool,
    pub violation_type: Option<ViolationType>,
    pub pattern_matched: Option<String>,
    pub explanation: Option<String>,
}

impl SafetyCheck {
    fn safe() -> Self {
        Self { is_safe: true, violation_type: None, pattern_matched: None, explanation: None }
    }
}

struct GuardRule {
    violation_type: ViolationType,
    pattern: &'static str,
    explanation: &'static str,
}

const GUARD_RULES: &[GuardRule] = &[
    GuardRule {
        violation_type: ViolationType::LegalAdviceRequest,
        pattern: r"(?i)should (i|we|client) (file|appeal|settle|sue|proceed)",
        explanation: "Asks the system to recommend a course of legal action.",
    },
    GuardRule {
        violation_type: ViolationType::LegalAdviceRequest,
        pattern: r"(?i)do you recommend",
        explanation: "Directly requests a recommendation.",
    },
    GuardRule {
        violation_type: ViolationType::LegalAdviceRequest,
        pattern: r"(?i)what should (i|we) do",
        explanation: "Asks the system to prescribe a course of action.",
    },
    GuardRule {
        violation_type: ViolationType::OutcomePrediction,
        pattern: r"(?i)will (the )?(judge|court|tribunal) (rule|decide|grant|dismiss|hold)",
        explanation: "Asks for a prediction of a judicial outcome.",
    },
    GuardRule {
        violation_type: ViolationType::OutcomePrediction,
        pattern: r"(?i)what will (the )?(judge|court|tribunal) (decide|rule|hold)",
        explanation: "Asks for a prediction of a judicial outcome.",
    },
    GuardRule {
        violation_type: ViolationType::OutcomePrediction,
        pattern: r"(?i)likely to (rule|decide|grant|dismiss|hold)",
        explanation: "Asks for a prediction of a judicial outcome.",
    },
    GuardRule {
        violation_type: ViolationType::OutcomePrediction,
        pattern: r"(?i)(chances|likelihood) of",
        explanation: "Asks the system to estimate odds of success.",
    },
    GuardRule {
        violation_type: ViolationType::OutcomePrediction,
        pattern: r"(?i)will we win",
        explanation: "Asks the system to predict the outcome of the matter.",
    },
    GuardRule {
        violation_type: ViolationType::OutcomePrediction,
        pattern: r"(?i)can (i|we) succeed",
        explanation: "Asks the system to predict the outcome of the matter.",
    },
    GuardRule {
        violation_type: ViolationType::LiabilityConclusion,
        pattern: r"(?i)is the (defendant|plaintiff|accused) (guilty|liable|responsible)",
        explanation: "Asks the system to reach a liability conclusion.",
    },
    GuardRule {
        violation_type: ViolationType::LiabilityConclusion,
        pattern: r"(?i)did the .+ violate",
        explanation: "Asks the system to reach a liability conclusion.",
    },
];

fn compiled_rules() -> &'static Vec<(Regex, ViolationType, &'static str)> {
    static RULES: OnceLock<Vec<(Regex, ViolationType, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        GUARD_RULES
            .iter()
            .map(|rule| (Regex::new(rule.pattern).expect("guard pattern is valid regex"), rule.violation_type, rule.explanation))
            .collect()
    })
}

/// Pre-LLM guard: blocks queries asking for legal advice, outcome
/// predictions, or liability conclusions. Factual, timeline, entity,
/// citation, and summary questions pass through untouched. Disabled
/// entirely by [`SafetyConfig::guard_enabled`] for test harnesses.
pub fn check_query(query: &str, config: &SafetyConfig) -> SafetyCheck {
    if !config.guard_enabled {
        return SafetyCheck::safe();
    }

    for (regex, violation_type, explanation) in compiled_rules() {
        if let Some(m) = regex.find(query) {
            return SafetyCheck {
                is_safe: false,
                violation_type: Some(*violation_type),
                pattern_matched: Some(m.as_str().to_string()),
                explanation: Some(explanation.to_string()),
            };
        }
    }

    SafetyCheck::safe()
}

#[derive(Debug, Clone, Serialize)]
pub struct Replacement {
    pub original: String,
    pub replacement: String,
    pub start: usize,
    pub end: usize,
    pub rule_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizationResult {
    pub sanitized_text: String,
    pub replacements_made: Vec<Replacement>,
    pub sanitization_time_ms: f64,
    pub llm_policing_applied: bool,
}

struct PolicingRule {
    id: &'static str,
    pattern: &'static str,
    replacement: &'static str,
}

/// Ordered so more specific patterns (e.g. "conclusively proves") are
/// tried before their shorter substrings ("proves that").
const POLICING_RULES: &[PolicingRule] = &[
    PolicingRule { id: "violated_section", pattern: r"(?i)violated section (\w+)", replacement: "affected by Section $1" },
    PolicingRule { id: "violated_agreement", pattern: r"(?i)violated the agreement", replacement: "regarding the agreement terms" },
    PolicingRule { id: "defendant_guilty", pattern: r"(?i)defendant is guilty", replacement: "defendant's liability regarding" },
    PolicingRule { id: "is_entitled", pattern: r"(?i)is entitled", replacement: "potential entitlement" },
    PolicingRule { id: "will_rule", pattern: r"(?i)will rule", replacement: "may consider" },
    PolicingRule { id: "will_decide", pattern: r"(?i)will decide", replacement: "may consider" },
    PolicingRule { id: "will_grant", pattern: r"(?i)will grant", replacement: "may" },
    PolicingRule { id: "conclusively_proves", pattern: r"(?i)conclusively proves", replacement: "may suggest" },
    PolicingRule { id: "proves_that", pattern: r"(?i)proves that", replacement: "suggests that" },
    PolicingRule { id: "establishes_that", pattern: r"(?i)establishes that", replacement: "indicates that" },
    PolicingRule { id: "clearly_shows", pattern: r"(?i)clearly shows", replacement: "appears to show" },
    PolicingRule { id: "is_liable_for", pattern: r"(?i)is liable for", replacement: "regarding potential liability for" },
    PolicingRule { id: "is_responsible_for", pattern: r"(?i)is responsible for", replacement: "regarding potential responsibility for" },
    PolicingRule { id: "must_pay", pattern: r"(?i)must pay", replacement: "may be required to pay" },
    PolicingRule { id: "in_breach_of", pattern: r"(?i)in breach of", replacement: "regarding compliance with" },
];

fn compiled_policing_rules() -> &'static Vec<(Regex, &'static str, &'static str)> {
    static RULES: OnceLock<Vec<(Regex, &'static str, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        POLICING_RULES
            .iter()
            .map(|rule| (Regex::new(rule.pattern).expect("policing pattern is valid regex"), rule.id, rule.replacement))
            .collect()
    })
}

/// Returns the `[start, end)` byte ranges of every quoted span in `text`,
/// recognizing straight (`"..."`) and typographic (`"..."`) quote pairs.
/// Shallow by design: a span is whatever sits between one opening and the
/// next matching closing mark, with no nesting or escape handling.
fn quoted_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        let closing = match ch {
            '"' => '"',
            '\u{201C}' => '\u{201D}',
            _ => continue,
        };
        for (end, c2) in chars.by_ref() {
            if c2 == closing {
                spans.push((start, end + c2.len_utf8()));
                break;
            }
        }
    }
    spans
}

fn overlaps_any(start: usize, end: usize, spans: &[(usize, usize)]) -> bool {
    spans.iter().any(|&(s, e)| start < e && end > s)
}

/// Post-LLM policing: deterministic, case-insensitive rewrites that soften
/// language resembling legal conclusions. Runs in well under 5ms for a
/// typical paragraph since it's pure regex substitution with no LLM call
/// (`llm_policing_applied` is always `false` — reserved for a future LLM
/// fallback tier that does not exist yet). Quoted passages are preserved
/// verbatim and excluded from rewrites.
///
/// Every rule is matched against `text` itself, never against another
/// rule's output, so a `Replacement`'s `start`/`end` are always byte
/// offsets into the original input `police_text` was called with — not
/// into some other rule's intermediate rewrite. Rule order still decides
/// precedence on overlapping matches (e.g. "conclusively proves" claims
/// its span before "proves that" can match inside it); a later rule's
/// candidate is dropped, not applied on top of an earlier one's.
pub fn police_text(text: &str, config: &SafetyConfig) -> SanitizationResult {
    let start_instant = Instant::now();

    if !config.policing_enabled {
        return SanitizationResult {
            sanitized_text: text.to_string(),
            replacements_made: Vec::new(),
            sanitization_time_ms: start_instant.elapsed().as_secs_f64() * 1000.0,
            llm_policing_applied: false,
        };
    }

    let protected = if config.preserve_quotes { quoted_spans(text) } else { Vec::new() };

    // Candidate matches across every rule, claimed in rule order: a match
    // is kept only if it doesn't overlap a span an earlier rule already
    // claimed. This is what lets every offset stay anchored to `text`
    // instead of drifting with each rule's rewrite.
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut replacements: Vec<Replacement> = Vec::new();

    for (regex, rule_id, replacement_template) in compiled_policing_rules() {
        for m in regex.find_iter(text) {
            if overlaps_any(m.start(), m.end(), &protected) || overlaps_any(m.start(), m.end(), &claimed) {
                continue;
            }
            let rewritten = regex.replace(m.as_str(), *replacement_template).into_owned();
            claimed.push((m.start(), m.end()));
            replacements.push(Replacement {
                original: m.as_str().to_string(),
                replacement: rewritten,
                start: m.start(),
                end: m.end(),
                rule_id: rule_id.to_string(),
            });
        }
    }

    replacements.sort_by_key(|r| r.start);

    let mut sanitized = String::with_capacity(text.len());
    let mut last_end = 0;
    for replacement in &replacements {
        sanitized.push_str(&text[last_end..replacement.start]);
        sanitized.push_str(&replacement.replacement);
        last_end = replacement.end;
    }
    sanitized.push_str(&text[last_end..]);

    SanitizationResult {
        sanitized_text: sanitized,
        replacements_made: replacements,
        sanitization_time_ms: start_instant.elapsed().as_secs_f64() * 1000.0,
        llm_policing_applied: false,
    }
}
