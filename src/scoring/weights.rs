//! Score weights and named weight profiles
//!
//! Weights are plain configuration: [`score`](super::score) has no defaults of
//! its own. Two built-in profiles cover the common cases:
//! - `"splice"`: joining clips end to end. Room tone (noise floor) dominates,
//!   brightness matters, level barely does since the renderer level-matches.
//! - `"cross-layer"`: stacking clips. Rhythmic density dominates.
//!
//! Profiles can also be loaded from versioned JSON:
//!
//! ```
//! use stratum_splice::scoring::WeightProfiles;
//!
//! let json = r#"{
//!     "version": 1,
//!     "profiles": {
//!         "splice": { "noise_floor": 1.0, "centroid": 20.0, "level": 0.25 }
//!     }
//! }"#;
//! let profiles = WeightProfiles::from_json_str(json)?;
//! assert_eq!(profiles.get("splice")?.centroid, 20.0);
//! # Ok::<(), stratum_splice::EngineError>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Name of the end-to-end joining profile
pub const SPLICE: &str = "splice";

/// Name of the layering profile
pub const CROSS_LAYER: &str = "cross-layer";

/// Weight file format version understood by this crate
pub const WEIGHTS_VERSION: u32 = 1;

/// Per-axis weights of the compatibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight per dB of noise floor difference
    #[serde(default)]
    pub noise_floor: f32,

    /// Weight of the relative spectral centroid difference
    #[serde(default)]
    pub centroid: f32,

    /// Weight per dB of RMS level difference
    #[serde(default)]
    pub level: f32,

    /// Weight per second of duration difference
    #[serde(default)]
    pub duration: f32,

    /// Weight per onset/s of onset density difference
    #[serde(default)]
    pub onset_density: f32,
}

impl ScoreWeights {
    /// Joining preset: noise floor dominant, level weak
    pub fn splice() -> Self {
        Self {
            noise_floor: 1.0,
            centroid: 20.0,
            level: 0.25,
            duration: 0.0,
            onset_density: 0.0,
        }
    }

    /// Layering preset: onset density dominant
    pub fn cross_layer() -> Self {
        Self {
            noise_floor: 0.2,
            centroid: 5.0,
            level: 0.1,
            duration: 1.0,
            onset_density: 4.0,
        }
    }

    fn values(&self) -> [(&'static str, f32); 5] {
        [
            ("noise_floor", self.noise_floor),
            ("centroid", self.centroid),
            ("level", self.level),
            ("duration", self.duration),
            ("onset_density", self.onset_density),
        ]
    }

    /// Check that every weight is finite and non-negative and at least one is positive
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidWeightConfiguration` describing the first defect
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in self.values() {
            if !value.is_finite() {
                return Err(EngineError::invalid_weights(format!(
                    "weight '{}' is not finite ({})",
                    name, value
                )));
            }
            if value < 0.0 {
                return Err(EngineError::invalid_weights(format!(
                    "weight '{}' is negative ({})",
                    name, value
                )));
            }
        }
        if self.values().iter().all(|(_, v)| *v == 0.0) {
            return Err(EngineError::invalid_weights("all weights are zero"));
        }
        Ok(())
    }
}

/// Named, versioned collection of weight sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfiles {
    /// File format version
    pub version: u32,
    /// Weight sets by name
    pub profiles: BTreeMap<String, ScoreWeights>,
}

impl Default for WeightProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WeightProfiles {
    /// The built-in `"splice"` and `"cross-layer"` profiles
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(SPLICE.to_string(), ScoreWeights::splice());
        profiles.insert(CROSS_LAYER.to_string(), ScoreWeights::cross_layer());
        Self {
            version: WEIGHTS_VERSION,
            profiles,
        }
    }

    /// Parse and validate weight profiles from JSON
    ///
    /// # Errors
    ///
    /// - `EngineError::Serialization` for malformed JSON
    /// - `EngineError::InvalidWeightConfiguration` for an unknown version or
    ///   any invalid weight set
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let profiles: WeightProfiles =
            serde_json::from_str(json).map_err(|e| EngineError::json("parsing weight profiles", e))?;
        profiles.validate()?;
        log::debug!(
            "Loaded {} weight profile(s), version {}",
            profiles.profiles.len(),
            profiles.version
        );
        Ok(profiles)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Serialization` if serialization fails
    pub fn to_json_string(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::json("writing weight profiles", e))
    }

    /// Validate the version and every weight set
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidWeightConfiguration` naming the bad profile
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.version != WEIGHTS_VERSION {
            return Err(EngineError::invalid_weights(format!(
                "unsupported weight profile version {} (expected {})",
                self.version, WEIGHTS_VERSION
            )));
        }
        for (name, weights) in &self.profiles {
            weights.validate().map_err(|e| match e {
                EngineError::InvalidWeightConfiguration(msg) => {
                    EngineError::invalid_weights(format!("profile '{}': {}", name, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Look up a profile by name
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidWeightConfiguration` if no such profile exists
    pub fn get(&self, name: &str) -> Result<&ScoreWeights, EngineError> {
        self.profiles
            .get(name)
            .ok_or_else(|| EngineError::invalid_weights(format!("unknown weight profile '{}'", name)))
    }

    /// Add or replace a profile after validating it
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidWeightConfiguration` if `weights` is invalid
    pub fn insert(&mut self, name: impl Into<String>, weights: ScoreWeights) -> Result<(), EngineError> {
        weights.validate()?;
        self.profiles.insert(name.into(), weights);
        Ok(())
    }
}
