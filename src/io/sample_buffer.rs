//! Immutable decoded audio buffers
//!
//! A [`SampleBuffer`] owns interleaved `f32` samples behind an `Arc`, so clones
//! are cheap and every consumer sees the same read-only data. Slicing always
//! copies into a new allocation: a trimmed buffer never keeps the decoded
//! source alive.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Content fingerprint of a buffer (SHA-256 over layout and sample bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest
    pub fn from_hex(value: &str) -> Option<Self> {
        let bytes = hex::decode(value).ok()?;
        let digest: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(digest))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first 8 bytes are plenty to tell buffers apart in logs.
        write!(f, "Fingerprint({}…)", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a 64-character hex digest"))
    }
}

#[derive(Debug)]
struct BufferData {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    fingerprint: OnceLock<Fingerprint>,
}

/// Immutable interleaved audio segment plus its sample rate
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    inner: Arc<BufferData>,
}

impl SampleBuffer {
    /// Create a buffer from interleaved samples
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if `channels` or `sample_rate` is zero
    /// or the sample count is not a whole number of frames.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self, EngineError> {
        if channels == 0 {
            return Err(EngineError::invalid_input("channel count must be > 0"));
        }
        if sample_rate == 0 {
            return Err(EngineError::invalid_input("sample rate must be > 0"));
        }
        if samples.len() % channels as usize != 0 {
            return Err(EngineError::invalid_input(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }
        Ok(Self::from_parts(samples, channels, sample_rate))
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, EngineError> {
        Self::new(samples, 1, sample_rate)
    }

    /// Create a buffer of digital silence
    pub fn silent(frames: usize, channels: u16, sample_rate: u32) -> Result<Self, EngineError> {
        Self::new(vec![0.0; frames * channels.max(1) as usize], channels, sample_rate)
    }

    pub(crate) fn from_parts(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            inner: Arc::new(BufferData {
                samples,
                channels,
                sample_rate,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.inner.samples.len() / self.inner.channels as usize
    }

    /// True if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_s(&self) -> f64 {
        self.frames() as f64 / self.inner.sample_rate as f64
    }

    /// Duration in whole milliseconds (floored)
    pub fn duration_ms(&self) -> u64 {
        (self.frames() as u64 * 1000) / self.inner.sample_rate as u64
    }

    /// Convert a frame count to milliseconds
    pub fn frames_to_ms(&self, frames: usize) -> f64 {
        frames as f64 * 1000.0 / self.inner.sample_rate as f64
    }

    /// Convert milliseconds to a (rounded) frame count
    pub fn ms_to_frames(&self, ms: f64) -> usize {
        (ms.max(0.0) * self.inner.sample_rate as f64 / 1000.0).round() as usize
    }

    /// Mono downmix (average of channels); a copy even for mono buffers
    pub fn to_mono(&self) -> Vec<f32> {
        downmix_interleaved(&self.inner.samples, self.inner.channels as usize)
    }

    /// Copy frames `[start, end)` into a newly owned buffer
    ///
    /// Out-of-range bounds are clamped to the buffer.
    pub fn slice_frames(&self, start: usize, end: usize) -> SampleBuffer {
        let frames = self.frames();
        let end = end.min(frames);
        let start = start.min(end);
        let ch = self.inner.channels as usize;
        let samples = self.inner.samples[start * ch..end * ch].to_vec();
        Self::from_parts(samples, self.inner.channels, self.inner.sample_rate)
    }

    /// Produce a new buffer by transforming a copy of the samples
    pub fn map_samples(&self, f: impl FnOnce(&mut [f32])) -> SampleBuffer {
        let mut samples = self.inner.samples.clone();
        f(&mut samples);
        Self::from_parts(samples, self.inner.channels, self.inner.sample_rate)
    }

    /// Produce a new buffer scaled by a linear gain
    pub fn with_gain(&self, gain: f32) -> SampleBuffer {
        self.map_samples(|samples| {
            for sample in samples.iter_mut() {
                *sample *= gain;
            }
        })
    }

    /// True if both handles share the same backing storage
    pub fn shares_storage_with(&self, other: &SampleBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Content fingerprint, computed on first use and memoized
    pub fn fingerprint(&self) -> Fingerprint {
        *self.inner.fingerprint.get_or_init(|| {
            let mut hasher = Sha256::new();
            hasher.update(self.inner.channels.to_le_bytes());
            hasher.update(self.inner.sample_rate.to_le_bytes());
            for sample in self.inner.samples.iter() {
                hasher.update(sample.to_bits().to_le_bytes());
            }
            Fingerprint(hasher.finalize().into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_interleaving() {
        let result = SampleBuffer::new(vec![0.0; 5], 2, 44100);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert!(SampleBuffer::mono(vec![0.0; 4], 0).is_err());
    }

    #[test]
    fn test_frames_and_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 96_000], 2, 48_000).unwrap();
        assert_eq!(buffer.frames(), 48_000);
        assert_eq!(buffer.duration_ms(), 1000);
        assert!((buffer.duration_s() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_copies_and_clamps() {
        let buffer = SampleBuffer::new((0..20).map(|i| i as f32).collect(), 2, 8000).unwrap();
        let slice = buffer.slice_frames(2, 100);
        assert_eq!(slice.frames(), 8);
        assert_eq!(slice.samples()[0], 4.0);
        assert!(!slice.shares_storage_with(&buffer));
    }

    #[test]
    fn test_fingerprint_tracks_content_and_layout() {
        let a = SampleBuffer::mono(vec![0.1, 0.2, 0.3, 0.4], 16_000).unwrap();
        let b = SampleBuffer::mono(vec![0.1, 0.2, 0.3, 0.4], 16_000).unwrap();
        let c = SampleBuffer::mono(vec![0.1, 0.2, 0.3, 0.5], 16_000).unwrap();
        let d = SampleBuffer::new(vec![0.1, 0.2, 0.3, 0.4], 2, 16_000).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_ne!(a.fingerprint(), d.fingerprint());
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let fp = SampleBuffer::mono(vec![0.5; 16], 8000).unwrap().fingerprint();
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Fingerprint::from_hex(&hex), Some(fp));
        assert_eq!(Fingerprint::from_hex("abc"), None);
    }

    #[test]
    fn test_with_gain_leaves_original_untouched() {
        let buffer = SampleBuffer::mono(vec![0.5; 8], 8000).unwrap();
        let louder = buffer.with_gain(2.0);
        assert_eq!(buffer.samples()[0], 0.5);
        assert_eq!(louder.samples()[0], 1.0);
    }
}
