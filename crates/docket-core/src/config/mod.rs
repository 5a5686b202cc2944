pub mod ocr_config;
pub mod retrieval_config;
pub mod safety_config;
pub mod cache_config;
pub mod orchestrator_config;

use serde::{Deserialize, Serialize};

pub use ocr_config::OcrConfig;
pub use retrieval_config::RetrievalConfig;
pub use safety_config::SafetyConfig;
pub use cache_config::CacheConfig;
pub use orchestrator_config::OrchestratorConfig;

/// Top-level configuration aggregating every subsystem config. Every
/// field is `#[serde(default)]` so a partial TOML document (or none at
/// all) still produces a usable config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DocketConfig {
    pub ocr: OcrConfig,
    pub retrieval: RetrievalConfig,
    pub safety: SafetyConfig,
    pub cache: CacheConfig,
    pub orchestrator: OrchestratorConfig,
}

impl DocketConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
