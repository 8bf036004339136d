//! Layer mixing
//!
//! Each layer is gained to its own target level and summed sample-wise over
//! the length of the longest layer.

use crate::io::sample_buffer::SampleBuffer;

use super::splice::level_match;
use super::RenderConfig;

/// Sum layers after per-layer level matching
///
/// Layer `i` is matched to `layer_levels_db[i]`, or to `target_level_db`
/// when no per-layer level is given.
pub(crate) fn mix(layers: &[&SampleBuffer], config: &RenderConfig) -> Vec<f32> {
    let longest = layers.iter().map(|l| l.samples().len()).max().unwrap_or(0);
    let mut out = vec![0.0f32; longest];

    for (i, layer) in layers.iter().enumerate() {
        let target = config
            .layer_levels_db
            .get(i)
            .copied()
            .unwrap_or(config.target_level_db);
        let mut samples = layer.samples().to_vec();
        level_match(&mut samples, target, config.silence_floor_db);
        for (acc, sample) in out.iter_mut().zip(samples) {
            *acc += sample;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_sum_over_longest() {
        let a = SampleBuffer::mono(vec![0.2; 10], 1000).unwrap();
        let b = SampleBuffer::mono(vec![0.4; 6], 1000).unwrap();
        let config = RenderConfig {
            target_level_db: -20.0,
            layer_levels_db: vec![-20.0, -26.0206],
            ..RenderConfig::default()
        };
        let out = mix(&[&a, &b], &config);
        assert_eq!(out.len(), 10);
        assert!((out[0] - 0.15).abs() < 1e-4);
        assert!((out[8] - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_missing_layer_level_uses_target() {
        let a = SampleBuffer::mono(vec![0.5; 4], 1000).unwrap();
        let config = RenderConfig {
            target_level_db: -20.0,
            layer_levels_db: Vec::new(),
            ..RenderConfig::default()
        };
        let out = mix(&[&a], &config);
        assert!((out[0] - 0.1).abs() < 1e-4);
    }
}
