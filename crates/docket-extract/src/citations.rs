//! Citation extractor (C5): a regex pre-pass over formal citation patterns,
//! an LLM pass for everything else, a merge that dedupes by (act, section)
//! preferring the LLM record's richer quoted text, and an acronym table for
//! canonicalizing act names.

use std::collections::HashMap;

use regex::Regex;
use std::sync::OnceLock;

use docket_core::errors::DocketResult;
use docket_core::ids::{ChunkId, CitationId, DocumentId};
use docket_core::models::{ExtractedCitation, VerificationStatus};
use docket_core::traits::{Llm, LlmRequest};

/// Provenance the caller supplies for every citation pulled from one chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkProvenance {
    pub source_document_id: DocumentId,
    pub source_chunk_id: Option<ChunkId>,
    pub page_number: Option<u32>,
}

/// An extracted citation before it has been assigned a durable id or run
/// through verification — the shape both the regex and LLM passes produce.
#[derive(Debug, Clone)]
pub struct ExtractedCitationDraft {
    pub act_name: String,
    pub canonical_act_name: Option<String>,
    pub section: String,
    pub subsection: Option<String>,
    pub clause: Option<String>,
    pub raw_text: String,
    pub quoted_text: Option<String>,
    /// 0-100.
    pub confidence: u8,
}

impl ExtractedCitationDraft {
    fn dedup_key(&self) -> (String, String) {
        (normalize_act(&self.act_name), self.section.trim().to_lowercase())
    }

    fn into_citation(self, provenance: ChunkProvenance) -> ExtractedCitation {
        ExtractedCitation {
            id: CitationId::new(),
            act_name: self.act_name,
            canonical_act_name: self.canonical_act_name,
            section: self.section,
            subsection: self.subsection,
            clause: self.clause,
            raw_text: self.raw_text,
            quoted_text: self.quoted_text,
            confidence: self.confidence,
            verification_status: VerificationStatus::Pending,
            source_document_id: provenance.source_document_id,
            source_chunk_id: provenance.source_chunk_id,
            page_number: provenance.page_number,
        }
    }
}

const REGEX_CONFIDENCE: u8 = 75;

fn regex_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            // "Section 138 of the Negotiable Instruments Act", optional (1)(a).
            Regex::new(
                r"(?i)section\s+(?P<section>\d+[A-Za-z]?)(\s*\((?P<subsection>[0-9a-zA-Z]+)\))?(\s*\((?P<clause>[0-9a-zA-Z]+)\))?\s+of\s+(the\s+)?(?P<act>[A-Z][A-Za-z,.&' ]*?Act(?:,?\s*\d{4})?)",
            ).unwrap(),
            // "S. 138" shorthand, no act name captured.
            Regex::new(r"(?i)\bS\.\s*(?P<section>\d+[A-Za-z]?)(\s*\((?P<subsection>[0-9a-zA-Z]+)\))?\b").unwrap(),
            // "u/s 138" shorthand.
            Regex::new(r"(?i)\bu/s\.?\s*(?P<section>\d+[A-Za-z]?)(\s*\((?P<subsection>[0-9a-zA-Z]+)\))?\b").unwrap(),
        ]
    })
}

fn regex_prepass(text: &str) -> Vec<ExtractedCitationDraft> {
    let mut drafts = Vec::new();
    for pattern in regex_patterns() {
        for caps in pattern.captures_iter(text) {
            let section = caps.name("section").map(|m| m.as_str().to_string());
            let Some(section) = section else { continue };
            let act_name = caps.name("act").map(|m| m.as_str().trim().to_string()).unwrap_or_default();
            if act_name.is_empty() {
                // Shorthand forms ("S. 138", "u/s 138") carry no act name;
                // they're only useful once merged against an LLM-pass
                // citation for the same section, so skip standalone.
                continue;
            }
            drafts.push(ExtractedCitationDraft {
                act_name: act_name.clone(),
                canonical_act_name: Some(canonicalize_act(&act_name)),
                section,
                subsection: caps.name("subsection").map(|m| m.as_str().to_string()),
                clause: caps.name("clause").map(|m| m.as_str().to_string()),
                raw_text: caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default(),
                quoted_text: None,
                confidence: REGEX_CONFIDENCE,
            });
        }
    }
    drafts
}

async fn llm_pass(llm: &dyn Llm, text: &str) -> DocketResult<Vec<ExtractedCitationDraft>> {
    let prompt = format!(
        "Extract every statutory citation from the following legal text. \
         Respond with a JSON array of objects \
         {{act_name, canonical_name, section, subsection, clause, raw_text, quoted_text, confidence}} \
         where confidence is 0-100.\n\nTEXT:\n{text}"
    );
    let response = llm.complete(LlmRequest::new(prompt)).await?;
    Ok(parse_llm_response(&response.text))
}

fn parse_llm_response(raw: &str) -> Vec<ExtractedCitationDraft> {
    let trimmed = raw.trim();
    let json_text = if trimmed.starts_with("```") {
        trimmed.lines().filter(|l| !l.trim_start().starts_with("```")).collect::<Vec<_>>().join("\n")
    } else {
        trimmed.to_string()
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&json_text) else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let act_name = item.get("act_name")?.as_str()?.to_string();
            let section = item.get("section")?.as_str()?.to_string();
            Some(ExtractedCitationDraft {
                canonical_act_name: item
                    .get("canonical_name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .or_else(|| Some(canonicalize_act(&act_name))),
                act_name,
                section,
                subsection: item.get("subsection").and_then(|v| v.as_str()).map(str::to_string),
                clause: item.get("clause").and_then(|v| v.as_str()).map(str::to_string),
                raw_text: item.get("raw_text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                quoted_text: item.get("quoted_text").and_then(|v| v.as_str()).map(str::to_string),
                confidence: item.get("confidence").and_then(|v| v.as_u64()).unwrap_or(60).min(100) as u8,
            })
        })
        .collect()
}

/// Runs both passes and merges. Empty/whitespace input short-circuits to an
/// empty result without calling the LLM. When regex and LLM both produce a
/// citation for the same (act, section), the LLM record is kept (its
/// quoted text is richer); otherwise both survive.
pub async fn extract_citations(
    llm: &dyn Llm,
    text: &str,
    provenance: ChunkProvenance,
) -> DocketResult<Vec<ExtractedCitation>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let regex_drafts = regex_prepass(text);
    let llm_drafts = llm_pass(llm, text).await?;

    let mut merged: HashMap<(String, String), ExtractedCitationDraft> = HashMap::new();
    for draft in regex_drafts {
        merged.insert(draft.dedup_key(), draft);
    }
    for draft in llm_drafts {
        // LLM record always wins on key collision.
        merged.insert(draft.dedup_key(), draft);
    }

    Ok(merged.into_values().map(|d| d.into_citation(provenance)).collect())
}

/// Small acronym table collapsing common Indian-statute abbreviations to
/// canonical forms. Unknown names pass through verbatim (trimmed).
fn acronym_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("ipc", "Indian Penal Code"),
            ("crpc", "Code of Criminal Procedure"),
            ("cpc", "Code of Civil Procedure"),
            ("ni act", "Negotiable Instruments Act"),
            ("nia", "Negotiable Instruments Act"),
            ("it act", "Information Technology Act"),
            ("pocso", "Protection of Children from Sexual Offences Act"),
            ("posh", "Sexual Harassment of Women at Workplace Act"),
            ("sarfaesi", "Securitisation and Reconstruction of Financial Assets and Enforcement of Security Interest Act"),
        ])
    })
}

pub fn canonicalize_act(name: &str) -> String {
    let key = name.trim().to_lowercase();
    acronym_table().get(key.as_str()).map(|s| s.to_string()).unwrap_or_else(|| name.trim().to_string())
}

fn normalize_act(name: &str) -> String {
    canonicalize_act(name).to_lowercase()
}

/// Resolves the distinct set of acts referenced across a citation list to
/// their canonical display names, for the act-resolution tracker (C6).
pub fn unique_acts(citations: &[ExtractedCitation]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for citation in citations {
        let canonical = citation
            .canonical_act_name
            .clone()
            .unwrap_or_else(|| canonicalize_act(&citation.act_name));
        if seen.insert(canonical.to_lowercase()) {
            result.push(canonical);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_prepass_recognizes_section_of_act() {
        let drafts = regex_prepass("As per Section 138 of the Negotiable Instruments Act, the cheque bounced.");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].section, "138");
        assert_eq!(drafts[0].confidence, 75);
        assert!(drafts[0].act_name.to_lowercase().contains("negotiable instruments"));
    }

    #[test]
    fn regex_prepass_captures_subsection_and_clause() {
        let drafts = regex_prepass("See Section 56(2)(a) of the Companies Act, 2013 for details.");
        assert_eq!(drafts[0].subsection.as_deref(), Some("2"));
        assert_eq!(drafts[0].clause.as_deref(), Some("a"));
    }

    #[test]
    fn empty_input_short_circuits() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        struct NeverCalled;
        #[async_trait::async_trait]
        impl Llm for NeverCalled {
            async fn complete(&self, _: docket_core::traits::LlmRequest) -> DocketResult<docket_core::traits::LlmResponse> {
                panic!("must not be called for empty input")
            }
            async fn stream(&self, _: docket_core::traits::LlmRequest) -> DocketResult<futures::stream::BoxStream<'static, DocketResult<String>>> {
                panic!("must not be called for empty input")
            }
        }
        let provenance = ChunkProvenance {
            source_document_id: DocumentId::new(),
            source_chunk_id: None,
            page_number: None,
        };
        let result = runtime.block_on(extract_citations(&NeverCalled, "   ", provenance)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn canonicalize_act_resolves_known_acronyms_and_passes_through_unknown() {
        assert_eq!(canonicalize_act("IPC"), "Indian Penal Code");
        assert_eq!(canonicalize_act("Some Obscure Act"), "Some Obscure Act");
    }

    #[test]
    fn unique_acts_dedupes_case_insensitively() {
        let provenance = ChunkProvenance {
            source_document_id: DocumentId::new(),
            source_chunk_id: None,
            page_number: None,
        };
        let a = ExtractedCitationDraft {
            act_name: "ipc".into(),
            canonical_act_name: Some("Indian Penal Code".into()),
            section: "420".into(),
            subsection: None,
            clause: None,
            raw_text: String::new(),
            quoted_text: None,
            confidence: 80,
        }
        .into_citation(provenance);
        let b = ExtractedCitationDraft {
            act_name: "Indian Penal Code".into(),
            canonical_act_name: Some("Indian Penal Code".into()),
            section: "302".into(),
            subsection: None,
            clause: None,
            raw_text: String::new(),
            quoted_text: None,
            confidence: 80,
        }
        .into_citation(provenance);
        let acts = unique_acts(&[a, b]);
        assert_eq!(acts, vec!["Indian Penal Code".to_string()]);
    }
}
