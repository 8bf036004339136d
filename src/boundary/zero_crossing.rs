//! Zero-crossing search
//!
//! A crossing at index `i` means the quantized sign of sample `i - 1` differs
//! from that of sample `i`; cutting at `i` keeps the jump between the last
//! kept and first dropped sample minimal. Samples whose magnitude is at or
//! below the amplitude threshold quantize to zero.

/// Which side wins when two crossings are equally close to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Prefer the crossing before the target (start edges)
    Earlier,
    /// Prefer the crossing after the target (end edges)
    Later,
}

fn quantized_sign(sample: f32, threshold: f32) -> i8 {
    if sample.abs() <= threshold {
        0
    } else if sample > 0.0 {
        1
    } else {
        -1
    }
}

/// True if a crossing sits at index `i` of `samples`
pub fn is_crossing(samples: &[f32], i: usize, threshold: f32) -> bool {
    i > 0
        && i < samples.len()
        && quantized_sign(samples[i - 1], threshold) != quantized_sign(samples[i], threshold)
}

/// Find the crossing nearest to `target` within `radius` indices
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `target` - Index to search around (may equal `samples.len()`)
/// * `radius` - Search radius in indices
/// * `threshold` - Magnitude at or below which a sample counts as zero
/// * `tie` - Side preferred when two crossings are equally close
///
/// # Returns
///
/// The crossing index, or `None` if the window holds no crossing
pub fn nearest_zero_crossing(
    samples: &[f32],
    target: usize,
    radius: usize,
    threshold: f32,
    tie: TieBreak,
) -> Option<usize> {
    // Every index of `samples` is within `len` of a target at or below `len`
    let radius = radius.min(samples.len().max(target));
    for distance in 0..=radius {
        let before = target.checked_sub(distance);
        let after = target.checked_add(distance);

        let hit_before = before.filter(|&i| is_crossing(samples, i, threshold));
        let hit_after = after.filter(|&i| is_crossing(samples, i, threshold));

        let found = match tie {
            TieBreak::Earlier => hit_before.or(hit_after),
            TieBreak::Later => hit_after.or(hit_before),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}
