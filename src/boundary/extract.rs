//! Candidate pool extraction
//!
//! Locates, verifies and profiles every take of one slot in parallel. A source
//! that fails is logged and reported back as skipped; the rest of the batch is
//! unaffected.

use rayon::prelude::*;

use super::verify::{locate_verified, EventVerifier, RetryPolicy};
use super::{BoundaryConfig, TimeRange};
use crate::assembly::candidate::{Candidate, CandidateOption, SourceId};
use crate::error::EngineError;
use crate::features::cache::ProfileCache;
use crate::io::sample_buffer::SampleBuffer;

/// One recording of a slot's event plus its approximate location
#[derive(Debug, Clone)]
pub struct SourceClip {
    /// Caller-assigned identity of the take
    pub id: SourceId,
    /// Decoded source buffer
    pub buffer: SampleBuffer,
    /// Approximate location of the event in `buffer`
    pub range: TimeRange,
}

/// A source that could not be turned into an option
#[derive(Debug)]
pub struct SkippedSource {
    /// Identity of the skipped take
    pub id: SourceId,
    /// Why it was skipped
    pub error: EngineError,
}

/// Result of extracting one slot
#[derive(Debug)]
pub struct Extraction {
    /// Slot with every usable option, in source order
    pub candidate: Candidate,
    /// Sources that failed, in source order
    pub skipped: Vec<SkippedSource>,
}

/// Build a slot's candidate pool from many source takes
///
/// # Arguments
///
/// * `slot` - Slot name (also used for logging)
/// * `expected_event` - Label handed to the verifier
/// * `sources` - Takes to extract from
/// * `config` - Locator configuration
/// * `policy` - Verification retry policy
/// * `verifier` - Event oracle
/// * `cache` - Profile cache shared across slots
///
/// # Returns
///
/// The candidate (possibly with an empty pool) plus every skipped source
pub fn extract_candidate(
    slot: &str,
    expected_event: &str,
    sources: &[SourceClip],
    config: &BoundaryConfig,
    policy: &RetryPolicy,
    verifier: &dyn EventVerifier,
    cache: &ProfileCache,
) -> Extraction {
    let results: Vec<Result<CandidateOption, SkippedSource>> = sources
        .par_iter()
        .map(|source| {
            locate_verified(
                &source.buffer,
                source.range,
                expected_event,
                config,
                policy,
                verifier,
            )
            .map(|clip| {
                let profile = cache.get_or_profile(&clip.buffer);
                CandidateOption::new(source.id.clone(), clip.buffer, profile)
            })
            .map_err(|error| SkippedSource {
                id: source.id.clone(),
                error,
            })
        })
        .collect();

    let mut options = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(option) => options.push(option),
            Err(skip) => {
                log::warn!("Skipping source '{}' for slot '{}': {}", skip.id, slot, skip.error);
                skipped.push(skip);
            }
        }
    }

    log::debug!(
        "Slot '{}': {} option(s), {} skipped",
        slot,
        options.len(),
        skipped.len()
    );

    Extraction {
        candidate: Candidate::new(slot, options),
        skipped,
    }
}
