//! Fade curves for edge de-clicking and crossfades
//!
//! Gains operate on frames of interleaved buffers: every channel of a frame
//! receives the same gain.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Shape of a fade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Straight-line ramp
    #[default]
    Linear,
    /// Sine/cosine ramp; the two halves of a crossfade sum to constant power
    EqualPower,
}

impl FadeCurve {
    /// Fade-in gain at `progress` in [0, 1]
    pub fn gain_in(self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => progress,
            FadeCurve::EqualPower => (FRAC_PI_2 * progress).sin(),
        }
    }

    /// Fade-out gain at `progress` in [0, 1]
    pub fn gain_out(self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => 1.0 - progress,
            FadeCurve::EqualPower => (FRAC_PI_2 * progress).cos(),
        }
    }
}

/// A fade of `length` frames with a given curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSpec {
    length: usize,
    curve: FadeCurve,
}

impl FadeSpec {
    /// Create a fade spec
    pub fn new(length: usize, curve: FadeCurve) -> Self {
        Self { length, curve }
    }

    /// Fade length in frames
    pub fn length(&self) -> usize {
        self.length
    }

    /// Fade curve
    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    fn progress(&self, index: usize) -> f32 {
        if self.length <= 1 {
            return 1.0;
        }
        (index as f32).clamp(0.0, (self.length - 1) as f32) / (self.length - 1) as f32
    }

    /// Fade-in gain for frame `index` of the fade
    pub fn gain_in_at(&self, index: usize) -> f32 {
        if self.length <= 1 {
            return 1.0;
        }
        self.curve.gain_in(self.progress(index))
    }

    /// Fade-out gain for frame `index` of the fade
    pub fn gain_out_at(&self, index: usize) -> f32 {
        if self.length <= 1 {
            return 1.0;
        }
        self.curve.gain_out(self.progress(index))
    }

    /// Fade in the first `length` frames of an interleaved buffer
    pub fn apply_in(&self, samples: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = samples.len() / channels;
        let len = self.length.min(frames);
        for (i, frame) in samples.chunks_exact_mut(channels).take(len).enumerate() {
            let gain = self.gain_in_at(i);
            frame.iter_mut().for_each(|s| *s *= gain);
        }
    }

    /// Fade out the last `length` frames of an interleaved buffer
    pub fn apply_out(&self, samples: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = samples.len() / channels;
        let len = self.length.min(frames);
        let start = frames - len;
        for (i, frame) in samples
            .chunks_exact_mut(channels)
            .skip(start)
            .enumerate()
        {
            let gain = self.gain_out_at(i);
            frame.iter_mut().for_each(|s| *s *= gain);
        }
    }
}
