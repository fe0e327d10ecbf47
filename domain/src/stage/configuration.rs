//! Versioned stage configurations

use super::definition::Stage;
use crate::core::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Version number of a stage configuration
///
/// Index 0 is reserved for "unconfigured"; the first configuration is 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConfigIndex(u32);

impl ConfigIndex {
    pub const UNCONFIGURED: ConfigIndex = ConfigIndex(0);

    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_configured(&self) -> bool {
        self.0 != 0
    }

    /// The index allocated after this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ConfigIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable, versioned ordered sequence of stages
///
/// Deserialization runs the same validation as [`StageConfiguration::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredConfiguration")]
pub struct StageConfiguration {
    index: ConfigIndex,
    stages: Vec<Stage>,
}

#[derive(Deserialize)]
struct StoredConfiguration {
    index: ConfigIndex,
    stages: Vec<Stage>,
}

impl TryFrom<StoredConfiguration> for StageConfiguration {
    type Error = ConfigurationError;

    fn try_from(stored: StoredConfiguration) -> Result<Self, Self::Error> {
        if !stored.index.is_configured() {
            return Err(ConfigurationError::IndexOutOfOrder {
                expected: ConfigIndex::new(1),
                found: stored.index,
            });
        }
        Self::new(stored.index, stored.stages)
    }
}

impl StageConfiguration {
    /// Validate `stages` and bind them to `index`.
    ///
    /// Capability checks against live bodies are not part of this; they need
    /// the probe port and happen in the application layer.
    pub fn new(index: ConfigIndex, stages: Vec<Stage>) -> Result<Self, ConfigurationError> {
        validate_stages(&stages)?;
        Ok(Self { index, stages })
    }

    pub fn index(&self) -> ConfigIndex {
        self.index
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Index of the last stage
    pub fn final_stage(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }
}

/// Validate a full stage sequence: non-empty, and every stage well-formed.
pub fn validate_stages(stages: &[Stage]) -> Result<(), ConfigurationError> {
    if stages.is_empty() {
        return Err(ConfigurationError::EmptyStages);
    }
    stages
        .iter()
        .enumerate()
        .try_for_each(|(id, stage)| stage.validate(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::body::{Body, ResultKind};
    use std::time::Duration;

    fn stage(min: u64, max: u64) -> Stage {
        Stage {
            bodies: vec![Body::manual("a", ResultKind::Approval)],
            max_advance: Duration::from_secs(max),
            min_advance: Duration::from_secs(min),
            vote_duration: Duration::ZERO,
            approval_threshold: 1,
            veto_threshold: 0,
        }
    }

    #[test]
    fn test_empty_stages_rejected() {
        assert_eq!(
            StageConfiguration::new(ConfigIndex::new(1), vec![]),
            Err(ConfigurationError::EmptyStages)
        );
    }

    #[test]
    fn test_invalid_later_stage_reports_its_index() {
        let result = StageConfiguration::new(ConfigIndex::new(1), vec![stage(0, 10), stage(10, 5)]);
        assert_eq!(
            result,
            Err(ConfigurationError::MinAdvanceNotBelowMax { stage: 1 })
        );
    }

    #[test]
    fn test_configuration_keeps_stages_in_order() {
        let stages = vec![stage(0, 10), stage(1, 20)];
        let config = StageConfiguration::new(ConfigIndex::new(2), stages.clone()).unwrap();
        assert_eq!(config.index(), ConfigIndex::new(2));
        assert_eq!(config.stages(), stages.as_slice());
        assert_eq!(config.final_stage(), 1);
    }

    #[test]
    fn test_deserialize_rejects_invalid_stages() {
        let empty: Result<StageConfiguration, _> =
            serde_json::from_str(r#"{"index":1,"stages":[]}"#);
        assert!(
            empty
                .unwrap_err()
                .to_string()
                .contains("at least one stage")
        );

        let valid = StageConfiguration::new(ConfigIndex::new(1), vec![stage(0, 10)]).unwrap();
        let mut value = serde_json::to_value(&valid).unwrap();
        value["stages"][0]["approval_threshold"] = serde_json::json!(5);
        assert!(serde_json::from_value::<StageConfiguration>(value).is_err());

        let json = serde_json::to_string(&valid).unwrap();
        assert_eq!(
            serde_json::from_str::<StageConfiguration>(&json).unwrap(),
            valid
        );
    }

    #[test]
    fn test_config_index_sequence() {
        let index = ConfigIndex::UNCONFIGURED;
        assert!(!index.is_configured());
        assert_eq!(index.next(), ConfigIndex::new(1));
        assert!(index.next().is_configured());
    }
}
