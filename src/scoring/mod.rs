//! Compatibility scoring
//!
//! - Pairwise score between two feature profiles
//! - Named, versioned weight sets
//! - Precomputed score tables for the search

pub mod pairwise;
pub mod scorer;
pub mod weights;

use serde::{Deserialize, Serialize};

pub use pairwise::{PairMatrix, PairwiseTable};
pub use scorer::score;
pub use weights::{ScoreWeights, WeightProfiles, CROSS_LAYER, SPLICE};

/// How pair scores combine into an assembly's aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Slots play one after another: sum over adjacent slots
    #[default]
    Sequential,
    /// Slots play at once: sum over every unordered pair of slots
    Layered,
}

impl ScoringMode {
    /// Slot index pairs `(i, j)`, `i < j`, contributing to the aggregate
    pub fn slot_pairs(self, slots: usize) -> Vec<(usize, usize)> {
        match self {
            ScoringMode::Sequential => (1..slots).map(|j| (j - 1, j)).collect(),
            ScoringMode::Layered => (0..slots)
                .flat_map(|i| (i + 1..slots).map(move |j| (i, j)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_pairs() {
        assert!(ScoringMode::Sequential.slot_pairs(1).is_empty());
        assert_eq!(ScoringMode::Sequential.slot_pairs(3), vec![(0, 1), (1, 2)]);
        assert_eq!(ScoringMode::Layered.slot_pairs(3).len(), 3);
        assert_eq!(ScoringMode::Layered.slot_pairs(4).len(), 6);
    }
}
