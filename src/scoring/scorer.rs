//! Pairwise compatibility score
//!
//! score(a, b) = w_noise  * |Δnoise_floor_db|
//!             + w_cent   * |Δcentroid| / max(mean centroid, 1 Hz)
//!             + w_level  * |Δlevel_db|
//!             + w_dur    * |Δduration_ms| / 1000
//!             + w_onset  * |Δonset_density_hz|
//!
//! Every term is an absolute difference of commutative quantities, so the
//! score is exactly symmetric and, for non-negative weights, non-negative.

use super::weights::ScoreWeights;
use crate::features::profile::FeatureProfile;

/// Score how well two clips go together (lower is more compatible)
///
/// # Arguments
///
/// * `a` - Profile of the first clip
/// * `b` - Profile of the second clip
/// * `weights` - Per-axis weights
///
/// # Returns
///
/// Weighted distance, `0.0` for identical profiles
///
/// # Example
///
/// ```
/// use stratum_splice::features::FeatureProfile;
/// use stratum_splice::scoring::{score, ScoreWeights};
///
/// let quiet_room = FeatureProfile {
///     noise_floor_db: -70.0,
///     spectral_centroid_hz: 1500.0,
///     level_db: -20.0,
///     peak_db: -6.0,
///     duration_ms: 400,
///     onset_density_hz: 2.0,
/// };
/// let noisy_room = FeatureProfile { noise_floor_db: -45.0, ..quiet_room };
///
/// let weights = ScoreWeights::splice();
/// assert_eq!(score(&quiet_room, &quiet_room, &weights), 0.0);
/// assert_eq!(score(&quiet_room, &noisy_room, &weights), 25.0);
/// ```
pub fn score(a: &FeatureProfile, b: &FeatureProfile, weights: &ScoreWeights) -> f32 {
    let noise = (a.noise_floor_db - b.noise_floor_db).abs();

    let mean_centroid = ((a.spectral_centroid_hz + b.spectral_centroid_hz) * 0.5).max(1.0);
    let centroid = (a.spectral_centroid_hz - b.spectral_centroid_hz).abs() / mean_centroid;

    let level = (a.level_db - b.level_db).abs();
    let duration = (a.duration_ms as f32 - b.duration_ms as f32).abs() / 1000.0;
    let onset = (a.onset_density_hz - b.onset_density_hz).abs();

    weights.noise_floor * noise
        + weights.centroid * centroid
        + weights.level * level
        + weights.duration * duration
        + weights.onset_density * onset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(noise: f32, centroid: f32, level: f32, ms: u64, onset: f32) -> FeatureProfile {
        FeatureProfile {
            noise_floor_db: noise,
            spectral_centroid_hz: centroid,
            level_db: level,
            peak_db: level + 12.0,
            duration_ms: ms,
            onset_density_hz: onset,
        }
    }

    #[test]
    fn test_symmetric_and_non_negative() {
        let a = profile(-60.0, 1200.0, -22.0, 350, 3.0);
        let b = profile(-48.0, 2100.0, -17.5, 610, 5.5);
        for weights in [ScoreWeights::splice(), ScoreWeights::cross_layer()] {
            let ab = score(&a, &b, &weights);
            let ba = score(&b, &a, &weights);
            assert_eq!(ab, ba);
            assert!(ab > 0.0);
        }
    }

    #[test]
    fn test_centroid_term_is_relative() {
        let weights = ScoreWeights {
            noise_floor: 0.0,
            centroid: 1.0,
            level: 0.0,
            duration: 0.0,
            onset_density: 0.0,
        };
        let low = score(
            &profile(-60.0, 100.0, -20.0, 400, 0.0),
            &profile(-60.0, 300.0, -20.0, 400, 0.0),
            &weights,
        );
        let high = score(
            &profile(-60.0, 1000.0, -20.0, 400, 0.0),
            &profile(-60.0, 3000.0, -20.0, 400, 0.0),
            &weights,
        );
        assert!((low - 1.0).abs() < 1e-6);
        assert!((high - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_centroids_do_not_divide_by_zero() {
        let a = profile(-60.0, 0.0, -20.0, 400, 0.0);
        let s = score(&a, &a, &ScoreWeights::splice());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_duration_and_onset_terms() {
        let weights = ScoreWeights::cross_layer();
        let a = profile(-60.0, 1000.0, -20.0, 1000, 2.0);
        let b = profile(-60.0, 1000.0, -20.0, 2500, 3.0);
        let expected = weights.duration * 1.5 + weights.onset_density * 1.0;
        assert!((score(&a, &b, &weights) - expected).abs() < 1e-5);
    }
}
