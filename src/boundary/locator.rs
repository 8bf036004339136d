//! Boundary locator
//!
//! Algorithm:
//! 1. Validate the approximate range against the buffer
//! 2. Pad both edges and convert to frame targets (floor/ceil, clamped)
//! 3. Snap each edge to the nearest zero crossing of the mono downmix
//! 4. Copy the frames out and apply micro-fades at both edges
//! 5. Reject results shorter than the configured minimum

use super::zero_crossing::{nearest_zero_crossing, TieBreak};
use super::{BoundaryConfig, TimeRange};
use crate::error::BoundaryError;
use crate::io::sample_buffer::SampleBuffer;
use crate::preprocessing::channel_mixer::downmix_interleaved;
use crate::preprocessing::fade::FadeSpec;

/// A trimmed clip plus where its edges landed
#[derive(Debug, Clone)]
pub struct TrimmedClip {
    /// Newly owned, faded clip
    pub buffer: SampleBuffer,
    /// Snapped start frame in the source (inclusive)
    pub start_frame: usize,
    /// Snapped end frame in the source (exclusive)
    pub end_frame: usize,
    /// Padded start target before snapping
    pub target_start: usize,
    /// Padded end target before snapping
    pub target_end: usize,
}

impl TrimmedClip {
    /// Frames the start edge moved (negative = earlier)
    pub fn start_shift(&self) -> i64 {
        self.start_frame as i64 - self.target_start as i64
    }

    /// Frames the end edge moved (negative = earlier)
    pub fn end_shift(&self) -> i64 {
        self.end_frame as i64 - self.target_end as i64
    }

    /// Clip length in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.buffer.frames_to_ms(self.buffer.frames())
    }
}

/// Locate precise boundaries for an approximate time range
///
/// # Arguments
///
/// * `buffer` - Source buffer the range refers to
/// * `range` - Approximate `[start, end)` in seconds
/// * `config` - Locator configuration
///
/// # Returns
///
/// The trimmed clip with its target and actual boundaries
///
/// # Errors
///
/// - `BoundaryError::OutOfRange` if the range is non-finite, empty, inverted,
///   or does not intersect the buffer
/// - `BoundaryError::TooShort` if the trimmed clip is below `min_duration_ms`
///
/// # Example
///
/// ```
/// use stratum_splice::boundary::{locate, BoundaryConfig, TimeRange};
/// use stratum_splice::SampleBuffer;
///
/// let samples: Vec<f32> = (0..16_000).map(|i| (i as f32 * 0.05).sin()).collect();
/// let source = SampleBuffer::mono(samples, 16_000)?;
///
/// let clip = locate(&source, TimeRange::new(0.25, 0.5), &BoundaryConfig::default())?;
/// assert!(clip.start_shift().abs() <= 64);
/// # Ok::<(), stratum_splice::EngineError>(())
/// ```
pub fn locate(
    buffer: &SampleBuffer,
    range: TimeRange,
    config: &BoundaryConfig,
) -> Result<TrimmedClip, BoundaryError> {
    let duration_s = buffer.duration_s();
    let out_of_range = || BoundaryError::OutOfRange {
        start_s: range.start_s,
        end_s: range.end_s,
        duration_s,
    };

    if !range.start_s.is_finite()
        || !range.end_s.is_finite()
        || range.start_s >= range.end_s
        || range.start_s >= duration_s
        || range.end_s <= 0.0
    {
        return Err(out_of_range());
    }

    let frames = buffer.frames();
    let rate = buffer.sample_rate() as f64;
    let pad_s = (config.pad_ms.max(0.0) as f64) / 1000.0;

    let target_start = (((range.start_s - pad_s).max(0.0) * rate).floor() as usize).min(frames);
    let target_end = (((range.end_s + pad_s) * rate).ceil() as usize).min(frames);

    let start_frame = snap_edge(buffer, target_start, config, TieBreak::Earlier);
    let end_frame = snap_edge(buffer, target_end, config, TieBreak::Later);

    let len = end_frame.saturating_sub(start_frame);
    let duration_ms = buffer.frames_to_ms(len);
    if duration_ms < config.min_duration_ms as f64 {
        return Err(BoundaryError::TooShort {
            duration_ms,
            min_duration_ms: config.min_duration_ms,
        });
    }

    let fade_len = buffer
        .ms_to_frames(config.fade_ms as f64)
        .min(len / 8)
        .max(1);
    let fade = FadeSpec::new(fade_len, config.fade_curve);
    let channels = buffer.channels() as usize;
    let trimmed = buffer
        .slice_frames(start_frame, end_frame)
        .map_samples(|samples| {
            fade.apply_in(samples, channels);
            fade.apply_out(samples, channels);
        });

    log::debug!(
        "Located [{:.3}s, {:.3}s): frames {}..{} (shift {:+}/{:+}), fade {} frames",
        range.start_s,
        range.end_s,
        start_frame,
        end_frame,
        start_frame as i64 - target_start as i64,
        end_frame as i64 - target_end as i64,
        fade_len
    );

    Ok(TrimmedClip {
        buffer: trimmed,
        start_frame,
        end_frame,
        target_start,
        target_end,
    })
}

/// Snap one edge target to the nearest zero crossing, or keep it
fn snap_edge(buffer: &SampleBuffer, target: usize, config: &BoundaryConfig, tie: TieBreak) -> usize {
    let frames = buffer.frames();
    // No crossing can lie further away than the buffer is long
    let radius = config.zero_cross_search_samples.min(frames);
    let channels = buffer.channels() as usize;

    // One extra frame on the left so a crossing at `target - radius` can see
    // its predecessor.
    let lo = target.saturating_sub(radius.saturating_add(1));
    let hi = target.saturating_add(radius.saturating_add(1)).min(frames);
    if lo >= hi {
        return target;
    }

    let window = downmix_interleaved(&buffer.samples()[lo * channels..hi * channels], channels);
    nearest_zero_crossing(
        &window,
        target - lo,
        radius,
        config.min_crossing_amplitude,
        tie,
    )
    .map(|i| i + lo)
    .unwrap_or(target)
}
