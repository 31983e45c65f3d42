//! Output configuration from TOML (`[output]` section)

use dispatch_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// How command results are printed
///
/// # Example
///
/// ```toml
/// [output]
/// format = "json"   # "text" when unset
/// color = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: Option<OutputFormat>,
    /// ANSI colors in text output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// `--output` when given, else `format`, else text.
    pub fn resolve_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or(self.format).unwrap_or_default()
    }

    /// JSON output is never colored.
    pub fn use_color(&self, format: OutputFormat) -> bool {
        self.color && format == OutputFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_overrides_file_format() {
        let config = FileOutputConfig {
            format: Some(OutputFormat::Json),
            color: true,
        };
        assert_eq!(config.resolve_format(None), OutputFormat::Json);
        assert_eq!(
            config.resolve_format(Some(OutputFormat::Text)),
            OutputFormat::Text
        );
        assert_eq!(
            FileOutputConfig::default().resolve_format(None),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_color_only_for_text() {
        let config = FileOutputConfig::default();
        assert!(config.use_color(OutputFormat::Text));
        assert!(!config.use_color(OutputFormat::Json));

        let plain = FileOutputConfig {
            color: false,
            ..Default::default()
        };
        assert!(!plain.use_color(OutputFormat::Text));
    }
}
