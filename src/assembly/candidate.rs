//! Slots and their option pools

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::cache::ProfileCache;
use crate::features::profile::FeatureProfile;
use crate::io::sample_buffer::SampleBuffer;

/// Caller-assigned identity of a source take
///
/// Two options with the same id are the same recording as far as the
/// no-reuse rule is concerned, even if their buffers differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One trimmed take available for a slot
#[derive(Debug, Clone)]
pub struct CandidateOption {
    /// Identity of the take
    pub source_id: SourceId,
    /// Trimmed audio
    pub buffer: SampleBuffer,
    /// Profile of `buffer`
    pub profile: FeatureProfile,
}

impl CandidateOption {
    /// Create an option from an already computed profile
    pub fn new(source_id: impl Into<SourceId>, buffer: SampleBuffer, profile: FeatureProfile) -> Self {
        Self {
            source_id: source_id.into(),
            buffer,
            profile,
        }
    }

    /// Create an option, profiling `buffer` through the cache
    pub fn profiled(source_id: impl Into<SourceId>, buffer: SampleBuffer, cache: &ProfileCache) -> Self {
        let profile = cache.get_or_profile(&buffer);
        Self::new(source_id, buffer, profile)
    }
}

/// A named slot and its pool of options
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Slot name (e.g. the word it holds)
    pub name: String,
    /// Options in insertion order; ties in the search resolve by this order
    pub options: Vec<CandidateOption>,
    /// Multiplier on the render gap placed before this slot (default: 1.0)
    pub gap_scale: f32,
}

impl Candidate {
    /// Create a slot with the default gap scale
    pub fn new(name: impl Into<String>, options: Vec<CandidateOption>) -> Self {
        Self {
            name: name.into(),
            options,
            gap_scale: 1.0,
        }
    }

    /// Set the gap scale (clamped to be non-negative)
    pub fn with_gap_scale(mut self, gap_scale: f32) -> Self {
        self.gap_scale = if gap_scale.is_finite() { gap_scale.max(0.0) } else { 1.0 };
        self
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// True if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
