//! Level measurement and normalization utilities
//!
//! Supports two normalization methods:
//! - Peak normalization (scales the largest sample to `ceiling_db`)
//! - RMS normalization (scales to `target_level_db`, then limits to `ceiling_db`)
//!
//! All level readings are in dBFS and floored at [`DB_FLOOR`] so downstream
//! arithmetic never sees infinities.
//!
//! # Example
//!
//! ```
//! use stratum_splice::preprocessing::normalization::{
//!     normalize, NormalizationConfig, NormalizationMethod,
//! };
//!
//! let mut samples = vec![0.05f32; 4410];
//! let config = NormalizationConfig {
//!     method: NormalizationMethod::Rms,
//!     target_level_db: -18.0,
//!     ceiling_db: -1.0,
//! };
//!
//! let metadata = normalize(&mut samples, &config)?;
//! assert!(metadata.gain_db > 0.0);
//! # Ok::<(), stratum_splice::EngineError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Lowest level reported by any measurement, in dBFS
pub const DB_FLOOR: f32 = -120.0;

/// Numerical stability epsilon for divisions
const EPSILON: f32 = 1e-10;

/// Normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// Scale so the absolute peak sits at the ceiling
    Peak,
    /// Scale to a target RMS level, limited by the ceiling
    #[default]
    Rms,
}

/// Normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Normalization method (default: Rms)
    pub method: NormalizationMethod,

    /// Target RMS level in dBFS (default: -18.0)
    pub target_level_db: f32,

    /// Peak ceiling in dBFS (default: -1.0)
    pub ceiling_db: f32,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            method: NormalizationMethod::Rms,
            target_level_db: -18.0,
            ceiling_db: -1.0,
        }
    }
}

/// Level metadata returned from normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessMetadata {
    /// Peak level in dBFS (before normalization)
    pub peak_db: f32,
    /// RMS level in dBFS (before normalization)
    pub rms_db: f32,
    /// Gain applied in dB
    pub gain_db: f32,
    /// True if the ceiling reduced the requested gain
    pub limited: bool,
}

/// Convert a linear amplitude to dBFS, floored at [`DB_FLOOR`]
pub fn linear_to_db(value: f32) -> f32 {
    if value <= EPSILON {
        return DB_FLOOR;
    }
    (20.0 * value.log10()).max(DB_FLOOR)
}

/// Convert dB to a linear gain factor
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Root-mean-square of the samples (0.0 for empty input)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Largest absolute sample value
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max)
}

/// RMS level in dBFS
pub fn rms_db(samples: &[f32]) -> f32 {
    linear_to_db(rms(samples))
}

/// Peak level in dBFS
pub fn peak_db(samples: &[f32]) -> f32 {
    linear_to_db(peak(samples))
}

/// Apply a linear gain in place
pub fn apply_gain(samples: &mut [f32], gain_linear: f32) {
    for sample in samples.iter_mut() {
        *sample *= gain_linear;
    }
}

/// Gain in dB that brings the RMS of `samples` to `target_db`
///
/// Returns `None` when the material is quieter than `silence_floor_db`; such
/// material is left alone rather than amplified into noise.
pub fn gain_to_target(samples: &[f32], target_db: f32, silence_floor_db: f32) -> Option<f32> {
    let level = rms_db(samples);
    if level <= silence_floor_db {
        return None;
    }
    Some(target_db - level)
}

/// Normalize audio samples in place
///
/// # Arguments
///
/// * `samples` - Audio samples to normalize (modified in-place)
/// * `config` - Normalization configuration
///
/// # Returns
///
/// `LoudnessMetadata` with the pre-normalization levels and applied gain
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` for empty input or a non-finite target.
pub fn normalize(
    samples: &mut [f32],
    config: &NormalizationConfig,
) -> Result<LoudnessMetadata, EngineError> {
    if samples.is_empty() {
        return Err(EngineError::invalid_input("Empty audio samples"));
    }
    if !config.target_level_db.is_finite() || !config.ceiling_db.is_finite() {
        return Err(EngineError::invalid_input(format!(
            "Non-finite normalization target: level={} ceiling={}",
            config.target_level_db, config.ceiling_db
        )));
    }

    let peak_linear = peak(samples);
    let rms_linear = rms(samples);
    let peak_level = linear_to_db(peak_linear);
    let rms_level = linear_to_db(rms_linear);

    if peak_linear <= EPSILON {
        log::warn!("Audio is silent or extremely quiet, cannot normalize");
        return Ok(LoudnessMetadata {
            peak_db: DB_FLOOR,
            rms_db: DB_FLOOR,
            gain_db: 0.0,
            limited: false,
        });
    }

    let requested_db = match config.method {
        NormalizationMethod::Peak => config.ceiling_db - peak_level,
        NormalizationMethod::Rms => config.target_level_db - rms_level,
    };

    // Never push the peak past the ceiling.
    let max_db = config.ceiling_db - peak_level;
    let limited = requested_db > max_db + 1e-4;
    let gain_db = requested_db.min(max_db);

    apply_gain(samples, db_to_linear(gain_db));

    if limited {
        log::debug!(
            "{:?} normalization limited by ceiling: requested {:.2} dB, applied {:.2} dB",
            config.method,
            requested_db,
            gain_db
        );
    } else {
        log::debug!(
            "{:?} normalization: rms={:.2} dB, peak={:.2} dB, gain={:.2} dB",
            config.method,
            rms_level,
            peak_level,
            gain_db
        );
    }

    Ok(LoudnessMetadata {
        peak_db: peak_level,
        rms_db: rms_level,
        gain_db,
        limited,
    })
}
