//! Engine configuration
//!
//! One [`EngineConfig`] aggregates the configuration of every component.
//! Every field has a documented default, and JSON files may set any subset:
//!
//! ```
//! use stratum_splice::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{
//!     "boundary": { "pad_ms": 15.0 },
//!     "render": { "join": "crossfade" }
//! }"#)?;
//! assert_eq!(config.boundary.pad_ms, 15.0);
//! assert_eq!(config.boundary.zero_cross_search_samples, 64);
//! # Ok::<(), stratum_splice::EngineError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::assembly::SearchConfig;
use crate::boundary::{BoundaryConfig, RetryPolicy, MAX_ZERO_CROSS_SEARCH_SAMPLES};
use crate::error::EngineError;
use crate::features::ProfileConfig;
use crate::render::RenderConfig;

/// Configuration of every engine component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Boundary locator
    pub boundary: BoundaryConfig,

    /// Verification retries
    pub retry: RetryPolicy,

    /// Feature profiler
    pub profile: ProfileConfig,

    /// Assembler search
    pub search: SearchConfig,

    /// Renderer
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Parse configuration from JSON and validate it
    ///
    /// # Errors
    ///
    /// - `EngineError::Serialization` for malformed JSON
    /// - `EngineError::InvalidWeightConfiguration` for invalid score weights
    /// - `EngineError::InvalidInput` for out-of-range parameters
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::json("parsing engine config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Serialization` if serialization fails
    pub fn to_json_string(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::json("writing engine config", e))
    }

    /// Check parameters that would otherwise fail deep inside a run
    ///
    /// # Errors
    ///
    /// - `EngineError::InvalidWeightConfiguration` for invalid score weights
    /// - `EngineError::InvalidInput` for out-of-range parameters
    pub fn validate(&self) -> Result<(), EngineError> {
        self.search.weights.validate()?;

        if !(self.profile.quiet_fraction > 0.0 && self.profile.quiet_fraction <= 1.0) {
            return Err(EngineError::invalid_input(format!(
                "quiet_fraction must be in (0, 1], got {}",
                self.profile.quiet_fraction
            )));
        }
        if self.profile.onset_frame_size == 0 || self.profile.onset_hop_size == 0 {
            return Err(EngineError::invalid_input("onset frame and hop sizes must be > 0"));
        }
        if self.boundary.zero_cross_search_samples > MAX_ZERO_CROSS_SEARCH_SAMPLES {
            return Err(EngineError::invalid_input(format!(
                "boundary.zero_cross_search_samples must be at most {}, got {}",
                MAX_ZERO_CROSS_SEARCH_SAMPLES, self.boundary.zero_cross_search_samples
            )));
        }
        for (name, value) in [
            ("boundary.pad_ms", self.boundary.pad_ms),
            ("boundary.fade_ms", self.boundary.fade_ms),
            ("retry.widen_ms", self.retry.widen_ms),
            ("render.gap_ms", self.render.gap_ms),
            ("render.crossfade_ms", self.render.crossfade_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::invalid_input(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.render.target_level_db.is_finite() || !self.render.ceiling_db.is_finite() {
            return Err(EngineError::invalid_input("render levels must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::normalization::NormalizationMethod;
    use crate::render::JoinMode;
    use crate::scoring::ScoringMode;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.search.exhaustive_ceiling, 250_000);
        assert_eq!(config.render.gap_ms, 70.0);
        assert_eq!(config.boundary.min_duration_ms, 50);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{
                "search": { "mode": "layered", "budget": { "max_combinations": 1000 } },
                "render": { "join": "crossfade", "normalization": "peak", "layer_levels_db": [-18.0, -24.0] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.search.mode, ScoringMode::Layered);
        assert_eq!(config.search.budget.max_combinations, Some(1000));
        assert_eq!(config.search.quiet_penalty, 3.0);
        assert_eq!(config.render.join, JoinMode::Crossfade);
        assert_eq!(config.render.normalization, NormalizationMethod::Peak);
        assert_eq!(config.render.layer_levels_db.len(), 2);
    }

    #[test]
    fn test_invalid_weights_in_config_are_fatal() {
        let err = EngineConfig::from_json_str(
            r#"{ "search": { "weights": { "noise_floor": -1.0 } } }"#,
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_out_of_range_parameters() {
        let mut config = EngineConfig::default();
        config.profile.quiet_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.render.gap_ms = -5.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidInput(_))));

        let mut config = EngineConfig::default();
        config.boundary.zero_cross_search_samples = usize::MAX;
        assert!(matches!(config.validate(), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_defaults_survive_json() {
        let json = EngineConfig::default().to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), EngineConfig::default());
    }
}
