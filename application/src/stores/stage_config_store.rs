//! Append-only arena of stage configurations

use serde::{Deserialize, Serialize};
use staged_domain::{ConfigIndex, ConfigurationError, Stage, StageConfiguration};

/// Versioned stage configurations
///
/// Entries are never mutated or removed. Proposals refer to an entry by its
/// [`ConfigIndex`], so an in-flight proposal keeps evaluating against the
/// configuration it was created under. A restored store must hold indices
/// 1..=n in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredConfigurations")]
pub struct StageConfigStore {
    configurations: Vec<StageConfiguration>,
}

#[derive(Deserialize)]
struct StoredConfigurations {
    configurations: Vec<StageConfiguration>,
}

impl TryFrom<StoredConfigurations> for StageConfigStore {
    type Error = ConfigurationError;

    fn try_from(stored: StoredConfigurations) -> Result<Self, Self::Error> {
        let mut expected = ConfigIndex::UNCONFIGURED;
        for configuration in &stored.configurations {
            expected = expected.next();
            if configuration.index() != expected {
                return Err(ConfigurationError::IndexOutOfOrder {
                    expected,
                    found: configuration.index(),
                });
            }
        }
        Ok(Self {
            configurations: stored.configurations,
        })
    }
}

impl StageConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the latest configuration, or `UNCONFIGURED`
    pub fn current_index(&self) -> ConfigIndex {
        self.configurations
            .last()
            .map(StageConfiguration::index)
            .unwrap_or(ConfigIndex::UNCONFIGURED)
    }

    pub fn get(&self, index: ConfigIndex) -> Option<&StageConfiguration> {
        let position = (index.get() as usize).checked_sub(1)?;
        self.configurations.get(position)
    }

    pub fn stages(&self, index: ConfigIndex) -> Option<&[Stage]> {
        self.get(index).map(StageConfiguration::stages)
    }

    pub fn current(&self) -> Option<&StageConfiguration> {
        self.configurations.last()
    }

    /// Validate `stages` and store them as the next version.
    pub fn append(&mut self, stages: Vec<Stage>) -> Result<ConfigIndex, ConfigurationError> {
        let index = self.current_index().next();
        let configuration = StageConfiguration::new(index, stages)?;
        self.configurations.push(configuration);
        Ok(index)
    }
}
