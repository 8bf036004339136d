//! Noise floor estimation
//!
//! The noise floor is the level of the quietest portion of a clip: the mean
//! energy of the quietest fraction of short windows, in dBFS. Two clips
//! recorded in different rooms differ most audibly here, so it dominates the
//! splice weight preset.

use crate::preprocessing::normalization::{linear_to_db, DB_FLOOR};

/// Estimate the noise floor of mono samples
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `window` - Window length in samples (clamped to at least 1)
/// * `quiet_fraction` - Fraction of windows (quietest first) averaged, in (0, 1]
///
/// # Returns
///
/// Noise floor in dBFS, [`DB_FLOOR`] for empty or digitally silent input
pub fn noise_floor_db(samples: &[f32], window: usize, quiet_fraction: f32) -> f32 {
    if samples.is_empty() {
        return DB_FLOOR;
    }
    let window = window.max(1);

    let mut energies: Vec<f64> = if samples.len() < window {
        vec![mean_square(samples)]
    } else {
        samples.chunks_exact(window).map(mean_square).collect()
    };
    energies.sort_by(|a, b| a.total_cmp(b));

    let fraction = if quiet_fraction.is_finite() {
        quiet_fraction.clamp(f32::EPSILON, 1.0)
    } else {
        1.0
    };
    let count = ((energies.len() as f32 * fraction).ceil() as usize).clamp(1, energies.len());
    let mean_energy = energies[..count].iter().sum::<f64>() / count as f64;

    // Energy is a power quantity: 10*log10(e) == 20*log10(sqrt(e))
    linear_to_db(mean_energy.sqrt() as f32)
}

fn mean_square(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_tracks_quiet_section() {
        // One second of hiss at 0.001 followed by a loud tone
        let mut samples: Vec<f32> = (0..16_000)
            .map(|i| if i % 2 == 0 { 0.001 } else { -0.001 })
            .collect();
        samples.extend((0..16_000).map(|i| 0.5 * (i as f32 * 0.1).sin()));

        let floor = noise_floor_db(&samples, 160, 0.15);
        assert!(
            (floor - (-60.0)).abs() < 0.5,
            "noise floor should be about -60 dBFS, got {:.2}",
            floor
        );
    }

    #[test]
    fn test_silence_hits_db_floor() {
        assert_eq!(noise_floor_db(&vec![0.0; 1000], 100, 0.15), DB_FLOOR);
        assert_eq!(noise_floor_db(&[], 100, 0.15), DB_FLOOR);
    }

    #[test]
    fn test_input_shorter_than_window() {
        let floor = noise_floor_db(&[0.1, -0.1, 0.1], 160, 0.15);
        assert!((floor - (-20.0)).abs() < 0.01);
    }
}
