use std::path::Path;

use serde::Deserialize;

use crate::error::ReconcileError;
use crate::options::{MatchOptions, ReconstructOptions};

/// Tunable thresholds for both stages, loadable from TOML:
///
/// ```toml
/// [reconstruct]
/// column_tolerance = 10.0
///
/// [matching]
/// similarity_threshold = 0.7
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reconstruct: ReconstructOptions,
    pub matching: MatchOptions,
}

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, ReconcileError> {
        let config: Self =
            toml::from_str(input).map_err(|e| ReconcileError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ReconcileError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        self.reconstruct.validate()?;
        self.matching.validate()
    }
}
