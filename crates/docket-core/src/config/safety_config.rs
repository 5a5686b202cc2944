use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Master switch for the C12 guard. Disabling is only ever appropriate
    /// in test harnesses.
    pub guard_enabled: bool,
    /// Master switch for deterministic rewrite (policing) rules.
    pub policing_enabled: bool,
    /// Quoted passages matching source text verbatim are exempt from
    /// rewrite even if they'd otherwise trip a pattern.
    pub preserve_quotes: bool,
    /// Max characters of context captured around a guard match for audit
    /// logging.
    pub match_context_chars: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            guard_enabled: true,
            policing_enabled: true,
            preserve_quotes: true,
            match_context_chars: 80,
        }
    }
}
