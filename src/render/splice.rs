//! Sequential splicing
//!
//! Parts are level-matched, then joined end to end with either a silent gap
//! or an equal-power crossfade.

use super::{JoinMode, RenderConfig};
use crate::io::sample_buffer::SampleBuffer;
use crate::preprocessing::fade::{FadeCurve, FadeSpec};
use crate::preprocessing::normalization::{apply_gain, db_to_linear, gain_to_target};

/// Level-match a part to the target, leaving near-silent parts untouched
pub(crate) fn level_match(samples: &mut [f32], target_db: f32, silence_floor_db: f32) {
    if let Some(gain_db) = gain_to_target(samples, target_db, silence_floor_db) {
        apply_gain(samples, db_to_linear(gain_db));
    }
}

/// Join parts in order; every part must share `channels`
///
/// `gap_scales[i]` scales the gap placed before part `i`.
pub(crate) fn splice(
    parts: &[&SampleBuffer],
    gap_scales: &[f32],
    channels: usize,
    sample_rate: u32,
    config: &RenderConfig,
) -> Vec<f32> {
    let ms_to_frames = |ms: f32| (ms.max(0.0) as f64 * sample_rate as f64 / 1000.0).round() as usize;

    let total_frames: usize = parts.iter().map(|p| p.frames()).sum();
    let mut out: Vec<f32> = Vec::with_capacity(total_frames * channels);
    let mut previous_frames = 0usize;

    for (i, part) in parts.iter().enumerate() {
        let mut samples = part.samples().to_vec();
        level_match(&mut samples, config.target_level_db, config.silence_floor_db);
        let frames = part.frames();

        if i == 0 {
            out.extend_from_slice(&samples);
            previous_frames = frames;
            continue;
        }

        match config.join {
            JoinMode::Gap => {
                let scale = gap_scales.get(i).copied().unwrap_or(1.0);
                let gap = ms_to_frames(config.gap_ms * scale);
                out.resize(out.len() + gap * channels, 0.0);
                out.extend_from_slice(&samples);
            }
            JoinMode::Crossfade => {
                let overlap = ms_to_frames(config.crossfade_ms)
                    .min(previous_frames / 2)
                    .min(frames / 2);
                let fade = FadeSpec::new(overlap, FadeCurve::EqualPower);
                let tail_start = out.len() - overlap * channels;
                for frame in 0..overlap {
                    let out_gain = fade.gain_out_at(frame);
                    let in_gain = fade.gain_in_at(frame);
                    for ch in 0..channels {
                        let idx = frame * channels + ch;
                        out[tail_start + idx] = out[tail_start + idx] * out_gain + samples[idx] * in_gain;
                    }
                }
                out.extend_from_slice(&samples[overlap * channels..]);
            }
        }
        previous_frames = frames;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(value: f32, frames: usize) -> SampleBuffer {
        SampleBuffer::mono(vec![value; frames], 1000).unwrap()
    }

    fn config(join: JoinMode) -> RenderConfig {
        RenderConfig {
            join,
            gap_ms: 10.0,
            crossfade_ms: 4.0,
            target_level_db: -20.0,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_gap_join_inserts_scaled_silence() {
        let a = part(0.5, 20);
        let b = part(0.05, 20);
        let out = splice(&[&a, &b], &[1.0, 0.5], 1, 1000, &config(JoinMode::Gap));
        assert_eq!(out.len(), 20 + 5 + 20);
        // both parts level-matched to -20 dBFS = 0.1
        assert!((out[0] - 0.1).abs() < 1e-4);
        assert!(out[20..25].iter().all(|&s| s == 0.0));
        assert!((out[30] - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_crossfade_join_overlaps() {
        let a = part(0.1, 20);
        let b = part(0.1, 20);
        let out = splice(&[&a, &b], &[1.0, 1.0], 1, 1000, &config(JoinMode::Crossfade));
        assert_eq!(out.len(), 20 + 20 - 4);
        // equal-power overlap of identical material rises above either input
        assert!(out[17] > 0.1);
    }

    #[test]
    fn test_crossfade_clamped_to_half_of_short_neighbour() {
        let a = part(0.1, 4);
        let b = part(0.1, 20);
        let out = splice(&[&a, &b], &[1.0, 1.0], 1, 1000, &config(JoinMode::Crossfade));
        assert_eq!(out.len(), 4 + 20 - 2);
    }

    #[test]
    fn test_silent_part_is_not_amplified() {
        let a = part(0.0, 10);
        let out = splice(&[&a], &[1.0], 1, 1000, &config(JoinMode::Gap));
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
