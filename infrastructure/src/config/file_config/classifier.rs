//! Classifier configuration from TOML (`[classifier]` section)

use dispatch_domain::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw classifier configuration from TOML
///
/// # Example
///
/// ```toml
/// [classifier]
/// high_complexity_chars = 200
/// lexicon = "lexicon.toml"      # optional; built-in table when unset
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileClassifierConfig {
    /// Requests longer than this are high complexity
    pub high_complexity_chars: usize,
    /// Replacement lexicon file (TOML or JSON)
    pub lexicon: Option<PathBuf>,
}

impl Default for FileClassifierConfig {
    fn default() -> Self {
        Self {
            high_complexity_chars: ClassifierConfig::default().high_complexity_chars,
            lexicon: None,
        }
    }
}

impl FileClassifierConfig {
    pub fn to_classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            high_complexity_chars: self.high_complexity_chars,
        }
    }
}
