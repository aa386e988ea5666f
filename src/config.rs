//! Construction-time configuration surface.
//!
//! Every tunable quantity in the engine lives here: decay and setpoints,
//! the event impact table, mode templates and their perturbation bounds,
//! the weight rule table, the boundary condition table, default caps, and
//! the drift guard. All of it is set at construction and never mutated;
//! [`PersonaConfig::validate`] runs before the engine accepts it.
//!
//! Configs are plain serde data and load from YAML or JSON documents.
//! Every field has a default, so partial documents override only what
//! they mention.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::affect::AffectConfig;
use crate::boundary::{default_conditions, BoundaryCaps, BoundaryCondition, BoundaryManager};
use crate::errors::ConfigurationError;
use crate::kernel::{default_weight_rules, WeightRule};
use crate::style::StyleConfig;

/// The full configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub affect: AffectConfig,
    pub style: StyleConfig,
    pub weight_rules: Vec<WeightRule>,
    pub conditions: Vec<BoundaryCondition>,
    /// Starting point for the boundary caps fold.
    pub default_caps: BoundaryCaps,
    /// Tone/stance excursion from the kernel baseline beyond which the
    /// drift guard engages.
    pub drift_threshold: f64,
    /// Blend weight pulling a drifted profile back toward baseline.
    pub drift_correction: f64,
    /// Upper bound on retained affect snapshots.
    pub history_limit: usize,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            affect: AffectConfig::default(),
            style: StyleConfig::default(),
            weight_rules: default_weight_rules(),
            conditions: default_conditions(),
            default_caps: BoundaryCaps::default(),
            drift_threshold: 0.3,
            drift_correction: 0.3,
            history_limit: 128,
        }
    }
}

impl PersonaConfig {
    /// Validate the whole surface. Called by the orchestrator constructor;
    /// failures here are fatal at startup and never occur mid-operation.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.affect.validate()?;
        self.style.validate()?;
        BoundaryManager::validate_conditions(&self.conditions)?;
        for (name, value) in [
            ("drift_threshold", self.drift_threshold),
            ("drift_correction", self.drift_correction),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ParameterOutOfRange { name, value });
            }
        }
        if self.history_limit == 0 {
            return Err(ConfigurationError::ParameterOutOfRange {
                name: "history_limit",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Load from a YAML document.
    pub fn from_yaml_str(doc: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_yaml::from_str(doc).map_err(|e| ConfigurationError::MalformedDocument {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an already-parsed JSON value.
    pub fn from_json_value(value: Value) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigurationError::MalformedDocument {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}
