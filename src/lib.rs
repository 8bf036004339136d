//! # Stratum Splice
//!
//! A boundary extraction, feature scoring and constrained assembly engine for
//! short audio fragments. Given several recorded takes of each word or sound
//! event, it trims them to click-free boundaries, profiles their acoustic
//! character, and searches the space of combinations for several ranked,
//! non-overlapping versions of a phrase (or a layered mix).
//!
//! ## Features
//!
//! - **Boundary location**: zero-crossing snapping, micro-fades, verification with widening retries
//! - **Feature profiling**: noise floor, spectral centroid, level, onset density; cached by fingerprint
//! - **Compatibility scoring**: weighted, symmetric pair distance with named weight profiles
//! - **Constrained assembly**: exhaustive or greedy search, global no-reuse, top-k with shortage reporting
//! - **Rendering**: gap or equal-power crossfade joins, layer mixing, level normalization
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_splice::assembly::{Candidate, CandidateOption, UsedSet};
//! use stratum_splice::boundary::{locate, TimeRange};
//! use stratum_splice::features::ProfileCache;
//! use stratum_splice::io::decoder::decode_file;
//! use stratum_splice::{build_versions, EngineConfig};
//!
//! let config = EngineConfig::default();
//! let cache = ProfileCache::new(config.profile.clone());
//!
//! let take = decode_file("take1.wav")?;
//! let hello = locate(&take, TimeRange::new(0.42, 0.81), &config.boundary)?;
//! let world = locate(&take, TimeRange::new(0.93, 1.37), &config.boundary)?;
//!
//! let slots = vec![
//!     Candidate::new("hello", vec![CandidateOption::profiled("take1", hello.buffer, &cache)]),
//!     Candidate::new("world", vec![CandidateOption::profiled("take1b", world.buffer, &cache)]),
//! ];
//!
//! let output = build_versions(&slots, 3, true, &mut UsedSet::new(), &config)?;
//! for version in &output.versions {
//!     println!("#{} score {:.2}", version.manifest.rank, version.manifest.aggregate_score);
//! }
//! # Ok::<(), stratum_splice::EngineError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Decoded takes → Boundary Locator → Feature Profiler → Pairwise Scores → Assembler → Renderer → Manifest
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembly;
pub mod boundary;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod manifest;
pub mod preprocessing;
pub mod render;
pub mod scoring;

use rayon::prelude::*;

// Re-export main types
pub use assembly::{assemble, Assembly, AssemblyOutcome, Candidate, CandidateOption, Shortage, SourceId, UsedSet};
pub use boundary::{locate, TimeRange, TrimmedClip};
pub use config::EngineConfig;
pub use error::{BoundaryError, EngineError};
pub use features::{profile, FeatureProfile};
pub use io::sample_buffer::{Fingerprint, SampleBuffer};
pub use manifest::{AssemblyManifest, RunManifest};
pub use render::render;
pub use scoring::{score, ScoreWeights, WeightProfiles};

/// One rendered assembly and its provenance
#[derive(Debug, Clone)]
pub struct RenderedVersion {
    /// Provenance, including the rendered length
    pub manifest: AssemblyManifest,
    /// Rendered audio
    pub audio: SampleBuffer,
}

/// Everything [`build_versions`] produced
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Rendered versions by rank
    pub versions: Vec<RenderedVersion>,
    /// Run provenance (shortage, strategy, used sources, every assembly)
    pub manifest: RunManifest,
}

impl BuildOutput {
    /// Shortfall against the requested count, if any
    pub fn shortage(&self) -> Option<Shortage> {
        self.manifest.shortage
    }
}

/// Main pipeline: assemble, render and describe up to `k` versions
///
/// Runs the constrained assembler over prepared candidates, renders each
/// accepted assembly (in parallel), and builds the run manifest.
///
/// # Arguments
///
/// * `candidates` - Slots in output order, each with a profiled pool
/// * `k` - Number of versions wanted
/// * `no_reuse` - Forbid any take from appearing in more than one version
/// * `used` - Takes already committed earlier in the run; updated in place
///   only when the whole build succeeds
/// * `config` - Engine configuration
///
/// # Returns
///
/// Rendered versions sorted by aggregate score, plus the run manifest. A
/// shortfall is reported in the manifest, not as an error.
///
/// # Errors
///
/// Returns `EngineError` if the configuration is invalid, the candidates are
/// malformed, or rendering fails
pub fn build_versions(
    candidates: &[Candidate],
    k: usize,
    no_reuse: bool,
    used: &mut UsedSet,
    config: &EngineConfig,
) -> Result<BuildOutput, EngineError> {
    use std::time::Instant;
    let start_time = Instant::now();

    config.validate()?;

    log::debug!(
        "Building {} version(s) from {} slot(s)",
        k,
        candidates.len()
    );

    // Sources are committed to `used` only once every version has rendered
    let mut pending = used.clone();
    let outcome = assemble(candidates, k, no_reuse, &mut pending, &config.search)?;

    let versions: Vec<RenderedVersion> = outcome
        .assemblies
        .par_iter()
        .map(|assembly| -> Result<RenderedVersion, EngineError> {
            let audio = render(assembly, &config.render)?;
            let manifest = AssemblyManifest::from_assembly(assembly).with_output(None, audio.duration_ms());
            Ok(RenderedVersion { manifest, audio })
        })
        .collect::<Result<_, _>>()?;

    *used = pending;
    let mut manifest = RunManifest::from_outcome(&outcome, used);
    manifest.assemblies = versions.iter().map(|v| v.manifest.clone()).collect();

    log::debug!(
        "Built {} version(s) in {:.2} ms",
        versions.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    Ok(BuildOutput { versions, manifest })
}
