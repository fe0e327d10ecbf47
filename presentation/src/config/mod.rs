//! Presentation-level configuration
//!
//! Configuration for output formatting.

use serde::{Deserialize, Serialize};
use staged_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            color: true,
        }
    }
}

impl OutputConfig {
    /// Apply command-line overrides on top of file settings
    pub fn with_overrides(mut self, format: Option<OutputFormat>, no_color: bool) -> Self {
        if let Some(format) = format {
            self.format = format;
        }
        if no_color {
            self.color = false;
        }
        self
    }

    /// Switch terminal colors on or off for everything formatted afterwards
    pub fn apply_color(&self) {
        colored::control::set_override(self.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = OutputConfig::default().with_overrides(Some(OutputFormat::Json), true);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.color);

        let config = OutputConfig::default().with_overrides(None, false);
        assert_eq!(config, OutputConfig::default());
    }
}
