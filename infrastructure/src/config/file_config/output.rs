//! Output configuration from TOML (`[output]` section)

use serde::{Deserialize, Serialize};
use staged_domain::OutputFormat;
use std::path::PathBuf;

// Re-export OutputFormat from domain for convenience
pub use staged_domain::OutputFormat as FileOutputFormat;

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format (uses domain type)
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
    /// Append committed events to this JSONL file
    pub event_log: Option<PathBuf>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            event_log: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_deserialize() {
        let toml_str = r#"
[output]
format = "json"
event_log = "logs/events.jsonl"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(
            config.output.event_log,
            Some(PathBuf::from("logs/events.jsonl"))
        );
        assert!(config.output.color);
    }
}
