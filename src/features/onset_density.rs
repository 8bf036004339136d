//! Onset density from energy flux
//!
//! Counts transient onsets per second of audio. Onsets are local maxima of the
//! positive frame-to-frame RMS change that clear a threshold set relative to
//! the strongest change in the clip.
//!
//! Algorithm:
//! 1. Divide audio into overlapping frames (frame_size, hop_size)
//! 2. Compute RMS energy per frame
//! 3. Positive flux: F[n] = max(0, E[n+1] - E[n])
//! 4. Threshold at `max(F) * 10^(threshold_db / 20)` and peak-pick
//!
//! Peak picking alone keeps detections at least two hops apart.
//!
//! Layers with similar onset density read as rhythmically compatible, which is
//! what the cross-layer weight preset leans on.

use crate::error::EngineError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Absolute flux below which a clip is considered steady (no onsets)
const MIN_FLUX: f32 = 1e-4;

/// Detect onset positions with the energy flux method
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `frame_size` - Analysis frame length in samples
/// * `hop_size` - Hop between frames in samples
/// * `threshold_db` - Threshold relative to the maximum flux (e.g. -20.0)
///
/// # Returns
///
/// Onset positions in samples, ascending
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` if `frame_size` or `hop_size` is zero
pub fn detect_onsets(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
    threshold_db: f32,
) -> Result<Vec<usize>, EngineError> {
    if frame_size == 0 || hop_size == 0 {
        return Err(EngineError::invalid_input(format!(
            "onset frame ({}) and hop ({}) must be > 0",
            frame_size, hop_size
        )));
    }

    if samples.len() < frame_size + hop_size {
        // Fewer than two frames, nothing to difference
        return Ok(Vec::new());
    }

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    let energies: Vec<f32> = (0..num_frames)
        .map(|i| {
            let frame = &samples[i * hop_size..i * hop_size + frame_size];
            let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
            (sum_sq / frame_size as f32).sqrt()
        })
        .collect();

    let flux: Vec<f32> = energies
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).max(0.0))
        .collect();

    let max_flux = flux.iter().copied().fold(0.0f32, f32::max);
    if max_flux <= MIN_FLUX.max(EPSILON) {
        return Ok(Vec::new());
    }
    let threshold = max_flux * 10.0_f32.powf(threshold_db / 20.0);

    let mut onsets = Vec::new();
    for (i, &value) in flux.iter().enumerate() {
        if value <= threshold {
            continue;
        }
        let prev = if i == 0 { 0.0 } else { flux[i - 1] };
        let next = flux.get(i + 1).copied().unwrap_or(0.0);
        if value > prev && value >= next {
            // flux[i] compares frame i+1 against frame i
            let position = (i + 1) * hop_size;
            if position < samples.len() {
                onsets.push(position);
            }
        }
    }

    log::debug!(
        "Energy flux: {} onset(s), max flux {:.5}, threshold {:.5}",
        onsets.len(),
        max_flux,
        threshold
    );

    Ok(onsets)
}

/// Onsets per second of audio
///
/// Returns 0.0 for empty input or when no onsets are found.
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` if `frame_size` or `hop_size` is zero
pub fn onset_density_hz(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    threshold_db: f32,
) -> Result<f32, EngineError> {
    if samples.is_empty() || sample_rate == 0 {
        return Ok(0.0);
    }
    let onsets = detect_onsets(samples, frame_size, hop_size, threshold_db)?;
    let duration_s = samples.len() as f32 / sample_rate as f32;
    Ok(onsets.len() as f32 / duration_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Short decaying bursts at a fixed interval
    fn click_train(duration_s: f32, interval_s: f32, sample_rate: u32) -> Vec<f32> {
        let len = (duration_s * sample_rate as f32) as usize;
        let interval = (interval_s * sample_rate as f32) as usize;
        let burst = (0.02 * sample_rate as f32) as usize;
        let mut samples = vec![0.0f32; len];
        let mut start = interval / 2;
        while start + burst < len {
            for i in 0..burst {
                let env = 1.0 - i as f32 / burst as f32;
                samples[start + i] = 0.8 * env * ((i as f32) * 0.3).sin();
            }
            start += interval;
        }
        samples
    }

    #[test]
    fn test_detects_regular_bursts() {
        let samples = click_train(2.0, 0.25, 16_000);
        let onsets = detect_onsets(&samples, 512, 128, -20.0).unwrap();
        assert!(
            (7..=9).contains(&onsets.len()),
            "expected about 8 onsets, got {}",
            onsets.len()
        );
        assert!(onsets.windows(2).all(|w| w[1] - w[0] >= 2 * 128));
    }

    #[test]
    fn test_density_scales_with_rate_of_events() {
        let slow = click_train(2.0, 0.5, 16_000);
        let fast = click_train(2.0, 0.2, 16_000);
        let slow_hz = onset_density_hz(&slow, 16_000, 512, 128, -20.0).unwrap();
        let fast_hz = onset_density_hz(&fast, 16_000, 512, 128, -20.0).unwrap();
        assert!(
            fast_hz > slow_hz,
            "denser bursts should give higher density ({} vs {})",
            fast_hz,
            slow_hz
        );
    }

    #[test]
    fn test_silence_and_short_input_have_no_onsets() {
        assert!(detect_onsets(&vec![0.0; 8000], 512, 128, -20.0)
            .unwrap()
            .is_empty());
        assert!(detect_onsets(&[0.5; 100], 512, 128, -20.0).unwrap().is_empty());
        assert_eq!(onset_density_hz(&[], 16_000, 512, 128, -20.0).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_hop_is_invalid() {
        assert!(detect_onsets(&[0.0; 4096], 512, 0, -20.0).is_err());
    }
}
