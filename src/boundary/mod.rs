//! Boundary location
//!
//! Turns an approximate, recognizer-supplied time range into a precise,
//! click-free clip:
//! - Zero-crossing snapping of each edge
//! - Micro-fades at the final edges
//! - Verification with bounded, widening retries
//! - Parallel extraction of a slot's candidate pool

pub mod extract;
pub mod locator;
pub mod verify;
pub mod zero_crossing;

use serde::{Deserialize, Serialize};

use crate::preprocessing::fade::FadeCurve;

pub use extract::{extract_candidate, Extraction, SkippedSource, SourceClip};
pub use locator::{locate, TrimmedClip};
pub use verify::{locate_verified, AcceptAll, EventVerifier, RetryPolicy};

/// Half-open time range `[start_s, end_s)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start in seconds
    pub start_s: f64,
    /// End in seconds (exclusive)
    pub end_s: f64,
}

impl TimeRange {
    /// Create a time range
    pub fn new(start_s: f64, end_s: f64) -> Self {
        Self { start_s, end_s }
    }

    /// Length in seconds (may be negative for inverted ranges)
    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Largest accepted zero-crossing search radius in frames
pub const MAX_ZERO_CROSS_SEARCH_SAMPLES: usize = 1 << 20;

/// Boundary locator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Padding added on both sides of the range in ms (default: 10.0)
    pub pad_ms: f32,

    /// Zero-crossing search radius around each edge in frames (default: 64)
    pub zero_cross_search_samples: usize,

    /// Samples at or below this magnitude count as zero (default: 0.0)
    pub min_crossing_amplitude: f32,

    /// Maximum edge fade length in ms (default: 6.0)
    pub fade_ms: f32,

    /// Edge fade shape (default: Linear)
    pub fade_curve: FadeCurve,

    /// Shortest acceptable trimmed clip in ms (default: 50)
    pub min_duration_ms: u32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            pad_ms: 10.0,
            zero_cross_search_samples: 64,
            min_crossing_amplitude: 0.0,
            fade_ms: 6.0,
            fade_curve: FadeCurve::Linear,
            min_duration_ms: 50,
        }
    }
}
