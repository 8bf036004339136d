//! Assembly result types

use serde::{Deserialize, Serialize};

use super::candidate::SourceId;
use crate::features::profile::FeatureProfile;
use crate::io::sample_buffer::SampleBuffer;
use crate::scoring::ScoringMode;

/// The option chosen for one slot
#[derive(Debug, Clone)]
pub struct AssemblyPart {
    /// Slot name
    pub slot: String,
    /// Identity of the chosen take
    pub source_id: SourceId,
    /// Index of the take in the slot's pool
    pub option_index: usize,
    /// Trimmed audio of the take
    pub buffer: SampleBuffer,
    /// Profile of the take
    pub profile: FeatureProfile,
    /// Gap multiplier before this part when rendering sequentially
    pub gap_scale: f32,
}

/// Score between two slots of an assembly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    /// First slot index
    pub slot_a: usize,
    /// Second slot index
    pub slot_b: usize,
    /// Pair score (lower is better)
    pub score: f32,
}

/// One accepted combination
#[derive(Debug, Clone)]
pub struct Assembly {
    /// 1-based rank within its outcome
    pub rank: usize,
    /// One part per slot, in slot order
    pub parts: Vec<AssemblyPart>,
    /// Sum of pair scores and quiet penalties (lower is better)
    pub aggregate_score: f32,
    /// Pair scores contributing to the aggregate
    pub pair_scores: Vec<PairScore>,
    /// Quiet penalty contributing to the aggregate
    pub penalty: f32,
    /// How the pairs were combined
    pub mode: ScoringMode,
}

impl Assembly {
    /// Source ids in slot order
    pub fn source_ids(&self) -> impl Iterator<Item = &SourceId> {
        self.parts.iter().map(|p| &p.source_id)
    }
}

/// Requested more assemblies than the constraints allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    /// Assemblies asked for
    pub requested: usize,
    /// Assemblies produced
    pub found: usize,
}

/// Strategy the assembler chose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Every combination enumerated
    Exhaustive,
    /// Greedy chains with local improvement
    Greedy,
}

/// Everything one `assemble` call produced
#[derive(Debug, Clone)]
pub struct AssemblyOutcome {
    /// Accepted assemblies, by non-decreasing aggregate score
    pub assemblies: Vec<Assembly>,
    /// Assemblies asked for
    pub requested: usize,
    /// Set when fewer than `requested` were found
    pub shortage: Option<Shortage>,
    /// Strategy used
    pub strategy: SearchStrategy,
    /// Full combinations scored
    pub combinations_considered: u64,
    /// True if the budget cut the search short
    pub budget_exhausted: bool,
}

impl AssemblyOutcome {
    /// Number of accepted assemblies
    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    /// True if nothing was accepted
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }

    /// Best assembly, if any
    pub fn best(&self) -> Option<&Assembly> {
        self.assemblies.first()
    }
}
