//! Feature profile of a trimmed clip
//!
//! A [`FeatureProfile`] is a fixed set of scalar descriptors computed once per
//! buffer from its mono downmix. Every descriptor is finite: dB values are
//! floored at [`DB_FLOOR`] and frequency/density readings fall back to zero.

use serde::{Deserialize, Serialize};

use super::noise_floor::noise_floor_db;
use super::onset_density::onset_density_hz;
use super::spectral::spectral_centroid_hz;
use crate::io::sample_buffer::SampleBuffer;
use crate::preprocessing::normalization::{peak_db, rms_db, DB_FLOOR};

/// Acoustic descriptors of a clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureProfile {
    /// Level of the quietest windows in dBFS
    pub noise_floor_db: f32,
    /// Magnitude-weighted mean frequency in Hz (0 for short or silent clips)
    pub spectral_centroid_hz: f32,
    /// RMS level in dBFS
    pub level_db: f32,
    /// Absolute peak in dBFS
    pub peak_db: f32,
    /// Clip length in whole milliseconds
    pub duration_ms: u64,
    /// Detected onsets per second
    pub onset_density_hz: f32,
}

impl FeatureProfile {
    /// Profile of an empty clip
    pub fn silent() -> Self {
        Self {
            noise_floor_db: DB_FLOOR,
            spectral_centroid_hz: 0.0,
            level_db: DB_FLOOR,
            peak_db: DB_FLOOR,
            duration_ms: 0,
            onset_density_hz: 0.0,
        }
    }
}

/// Profiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Window length for noise floor estimation in ms (default: 10.0)
    pub noise_window_ms: f32,

    /// Fraction of quietest windows averaged for the noise floor (default: 0.15)
    pub quiet_fraction: f32,

    /// Minimum clip length in frames for a centroid reading (default: 256)
    pub min_centroid_frames: usize,

    /// Onset detection frame size in samples (default: 1024)
    pub onset_frame_size: usize,

    /// Onset detection hop size in samples (default: 256)
    pub onset_hop_size: usize,

    /// Onset threshold relative to the strongest flux in dB (default: -20.0)
    pub onset_threshold_db: f32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            noise_window_ms: 10.0,
            quiet_fraction: 0.15,
            min_centroid_frames: 256,
            onset_frame_size: 1024,
            onset_hop_size: 256,
            onset_threshold_db: -20.0,
        }
    }
}

/// Compute the feature profile of a buffer
///
/// Deterministic and pure: the same buffer and config always yield the same
/// profile. Multi-channel buffers are analyzed on their mono downmix.
///
/// # Arguments
///
/// * `buffer` - Trimmed clip
/// * `config` - Profiler configuration
///
/// # Returns
///
/// The clip's [`FeatureProfile`]
///
/// # Example
///
/// ```
/// use stratum_splice::features::{profile, ProfileConfig};
/// use stratum_splice::SampleBuffer;
///
/// let buffer = SampleBuffer::mono(vec![0.1; 4800], 48_000)?;
/// let features = profile(&buffer, &ProfileConfig::default());
/// assert_eq!(features.duration_ms, 100);
/// assert!((features.level_db - (-20.0)).abs() < 0.01);
/// # Ok::<(), stratum_splice::EngineError>(())
/// ```
pub fn profile(buffer: &SampleBuffer, config: &ProfileConfig) -> FeatureProfile {
    if buffer.is_empty() {
        return FeatureProfile::silent();
    }

    let mono = buffer.to_mono();
    let sample_rate = buffer.sample_rate();
    let window = buffer.ms_to_frames(config.noise_window_ms as f64);

    let onset_density = match onset_density_hz(
        &mono,
        sample_rate,
        config.onset_frame_size,
        config.onset_hop_size,
        config.onset_threshold_db,
    ) {
        Ok(density) => density,
        Err(e) => {
            log::warn!("Onset density unavailable, reporting 0: {}", e);
            0.0
        }
    };

    let features = FeatureProfile {
        noise_floor_db: noise_floor_db(&mono, window, config.quiet_fraction),
        spectral_centroid_hz: spectral_centroid_hz(&mono, sample_rate, config.min_centroid_frames),
        level_db: rms_db(&mono),
        peak_db: peak_db(&mono),
        duration_ms: buffer.duration_ms(),
        onset_density_hz: onset_density,
    };

    log::debug!(
        "Profiled {} frames: noise {:.1} dB, centroid {:.0} Hz, level {:.1} dB, onsets {:.2}/s",
        buffer.frames(),
        features.noise_floor_db,
        features.spectral_centroid_hz,
        features.level_db,
        features.onset_density_hz
    );

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, amplitude: f32, frames: usize, sample_rate: u32) -> Vec<f32> {
        (0..frames)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_profile_is_deterministic() {
        let buffer = SampleBuffer::mono(tone(440.0, 0.3, 8000, 16_000), 16_000).unwrap();
        let config = ProfileConfig::default();
        assert_eq!(profile(&buffer, &config), profile(&buffer, &config));
    }

    #[test]
    fn test_profile_values_are_finite() {
        let config = ProfileConfig::default();
        for samples in [vec![0.0f32; 2000], vec![0.2f32; 10], tone(1000.0, 0.9, 4000, 16_000)] {
            let buffer = SampleBuffer::mono(samples, 16_000).unwrap();
            let p = profile(&buffer, &config);
            assert!(p.noise_floor_db.is_finite());
            assert!(p.spectral_centroid_hz.is_finite());
            assert!(p.level_db.is_finite());
            assert!(p.peak_db.is_finite());
            assert!(p.onset_density_hz.is_finite());
        }
    }

    #[test]
    fn test_stereo_profiles_like_its_downmix() {
        let mono = tone(500.0, 0.4, 4000, 16_000);
        let stereo: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
        let config = ProfileConfig::default();
        let a = profile(&SampleBuffer::mono(mono, 16_000).unwrap(), &config);
        let b = profile(&SampleBuffer::new(stereo, 2, 16_000).unwrap(), &config);
        assert!((a.level_db - b.level_db).abs() < 1e-4);
        assert!((a.spectral_centroid_hz - b.spectral_centroid_hz).abs() < 1e-2);
        assert_eq!(a.duration_ms, b.duration_ms);
    }

    #[test]
    fn test_empty_buffer_profile() {
        let buffer = SampleBuffer::mono(Vec::new(), 16_000).unwrap();
        assert_eq!(profile(&buffer, &ProfileConfig::default()), FeatureProfile::silent());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ProfileConfig = serde_json::from_str(r#"{"quiet_fraction": 0.25}"#).unwrap();
        assert_eq!(config.quiet_fraction, 0.25);
        assert_eq!(config.onset_frame_size, 1024);
    }
}
