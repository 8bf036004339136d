//! Channel mixing utilities (interleaved multi-channel to mono)
//!
//! Boundary search and feature profiling both work on a mono view of the
//! signal. The buffer itself keeps its original channel layout.

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMixMode {
    /// Simple average of all channels
    #[default]
    Mono,
    /// Keep the channel with the larger absolute value, per frame
    Dominant,
}

/// Downmix interleaved samples to mono by averaging channels
///
/// # Arguments
///
/// * `samples` - Interleaved samples
/// * `channels` - Number of interleaved channels (0 is treated as 1)
///
/// # Returns
///
/// One value per frame
pub fn downmix_interleaved(samples: &[f32], channels: usize) -> Vec<f32> {
    downmix_with_mode(samples, channels, ChannelMixMode::Mono)
}

/// Downmix interleaved samples to mono using the given mode
pub fn downmix_with_mode(samples: &[f32], channels: usize, mode: ChannelMixMode) -> Vec<f32> {
    let channels = channels.max(1);
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| match mode {
            ChannelMixMode::Mono => frame.iter().sum::<f32>() / channels as f32,
            ChannelMixMode::Dominant => frame
                .iter()
                .copied()
                .fold(0.0f32, |acc, x| if x.abs() > acc.abs() { x } else { acc }),
        })
        .collect()
}

/// Convert separate stereo channels to mono
///
/// Lengths may differ; the shorter channel is treated as zero-padded.
pub fn stereo_to_mono(left: &[f32], right: &[f32], mode: ChannelMixMode) -> Vec<f32> {
    let len = left.len().max(right.len());
    log::debug!("Converting {} stereo frames to mono using {:?}", len, mode);
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0.0);
            let r = right.get(i).copied().unwrap_or(0.0);
            match mode {
                ChannelMixMode::Mono => (l + r) * 0.5,
                ChannelMixMode::Dominant => {
                    if l.abs() >= r.abs() {
                        l
                    } else {
                        r
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(downmix_interleaved(&samples, 1), samples);
    }

    #[test]
    fn test_stereo_average() {
        let samples = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_interleaved(&samples, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_dominant_keeps_sign() {
        let samples = vec![0.2, -0.8, 0.9, 0.1];
        assert_eq!(
            downmix_with_mode(&samples, 2, ChannelMixMode::Dominant),
            vec![-0.8, 0.9]
        );
    }

    #[test]
    fn test_stereo_to_mono_uneven_lengths() {
        let mono = stereo_to_mono(&[1.0, 1.0], &[1.0], ChannelMixMode::Mono);
        assert_eq!(mono, vec![1.0, 0.5]);
    }
}
