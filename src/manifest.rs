//! Serializable provenance records
//!
//! An [`AssemblyManifest`] records which take filled each slot (by source id
//! and content fingerprint), the pair scores and the aggregate. A
//! [`RunManifest`] wraps every assembly of a run together with the shortage,
//! strategy and used set, and round-trips through JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assembly::candidate::SourceId;
use crate::assembly::result::{Assembly, AssemblyOutcome, PairScore, SearchStrategy, Shortage};
use crate::assembly::used_set::UsedSet;
use crate::error::EngineError;
use crate::features::profile::FeatureProfile;
use crate::io::sample_buffer::Fingerprint;
use crate::scoring::ScoringMode;

/// Manifest format version written by this crate
pub const MANIFEST_VERSION: u32 = 1;

/// One slot of an assembly manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestPart {
    /// Slot name
    pub slot: String,
    /// Take identity
    pub source_id: SourceId,
    /// Content fingerprint of the trimmed take
    pub fingerprint: Fingerprint,
    /// Features of the trimmed take
    pub profile: FeatureProfile,
}

/// Provenance of one assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyManifest {
    /// 1-based rank
    pub rank: usize,
    /// Aggregate score (lower is better)
    pub aggregate_score: f32,
    /// Quiet penalty included in the aggregate
    pub penalty: f32,
    /// How pair scores were combined
    pub mode: ScoringMode,
    /// Parts in slot order
    pub parts: Vec<ManifestPart>,
    /// Pair scores contributing to the aggregate
    pub pair_scores: Vec<PairScore>,
    /// Rendered file name, if written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Rendered length in ms, if rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AssemblyManifest {
    /// Describe an assembly (fingerprints are computed here if not yet cached)
    pub fn from_assembly(assembly: &Assembly) -> Self {
        Self {
            rank: assembly.rank,
            aggregate_score: assembly.aggregate_score,
            penalty: assembly.penalty,
            mode: assembly.mode,
            parts: assembly
                .parts
                .iter()
                .map(|p| ManifestPart {
                    slot: p.slot.clone(),
                    source_id: p.source_id.clone(),
                    fingerprint: p.buffer.fingerprint(),
                    profile: p.profile,
                })
                .collect(),
            pair_scores: assembly.pair_scores.clone(),
            filename: None,
            duration_ms: None,
        }
    }

    /// Record the rendered output
    pub fn with_output(mut self, filename: Option<String>, duration_ms: u64) -> Self {
        self.filename = filename;
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Source ids in slot order
    pub fn source_ids(&self) -> Vec<&SourceId> {
        self.parts.iter().map(|p| &p.source_id).collect()
    }
}

/// Provenance of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Manifest format version
    pub version: u32,
    /// Assemblies requested
    pub requested: usize,
    /// Set when fewer than requested were found
    pub shortage: Option<Shortage>,
    /// Search strategy used
    pub strategy: SearchStrategy,
    /// Full combinations scored
    pub combinations_considered: u64,
    /// True if the search budget cut the run short
    pub budget_exhausted: bool,
    /// Every source committed so far
    pub used_sources: UsedSet,
    /// Accepted assemblies by rank
    pub assemblies: Vec<AssemblyManifest>,
}

impl RunManifest {
    /// Describe an outcome and the used set after it
    pub fn from_outcome(outcome: &AssemblyOutcome, used: &UsedSet) -> Self {
        Self {
            version: MANIFEST_VERSION,
            requested: outcome.requested,
            shortage: outcome.shortage,
            strategy: outcome.strategy,
            combinations_considered: outcome.combinations_considered,
            budget_exhausted: outcome.budget_exhausted,
            used_sources: used.clone(),
            assemblies: outcome
                .assemblies
                .iter()
                .map(AssemblyManifest::from_assembly)
                .collect(),
        }
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Serialization` if serialization fails
    pub fn to_json_string(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::json("writing run manifest", e))
    }

    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Serialization` for malformed JSON and
    /// `EngineError::InvalidInput` for an unsupported version
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let manifest: RunManifest =
            serde_json::from_str(json).map_err(|e| EngineError::json("parsing run manifest", e))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(EngineError::invalid_input(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(manifest)
    }

    /// Write pretty JSON to `path`
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Serialization` or `EngineError::Io`
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let json = self.to_json_string()?;
        fs::write(path.as_ref(), json).map_err(|e| EngineError::io("writing run manifest", e))?;
        log::debug!("Wrote run manifest to {}", path.as_ref().display());
        Ok(())
    }

    /// Read and parse a manifest file
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Io`, `EngineError::Serialization` or
    /// `EngineError::InvalidInput`
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| EngineError::io("reading run manifest", e))?;
        Self::from_json_str(&json)
    }
}
