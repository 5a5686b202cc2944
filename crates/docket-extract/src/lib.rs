//! LLM-backed extraction passes over chunks: citations (C5), entities and
//! relationships (C7), and timeline events (C8). Each pass shares the same
//! shape — a regex or LLM prompt over chunk content, a tolerant JSON parse,
//! and a matter-scoped dedup/merge step — which is why they live together
//! instead of one crate per component.

pub mod citations;
pub mod entities;
pub mod timeline;

pub use citations::{extract_citations, unique_acts, ExtractedCitationDraft};
pub use entities::{dedupe_entities, extract_entities, ExtractionOutcome};
pub use timeline::{extract_timeline_events, link_entities, ExtractedDate};
