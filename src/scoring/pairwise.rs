//! Precomputed pairwise score table
//!
//! The search evaluates the same slot/option pairs many times, so every pair
//! it can need is scored once up front. Matrices are filled in parallel.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::scorer::score;
use super::weights::ScoreWeights;
use super::ScoringMode;
use crate::assembly::candidate::Candidate;

/// Scores between every option of one slot and every option of another
#[derive(Debug, Clone, PartialEq)]
pub struct PairMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl PairMatrix {
    /// Score between option `row` of the first slot and `col` of the second
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols + col]
    }

    /// Options in the first slot
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Options in the second slot
    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// Score matrices for the slot pairs a scoring mode combines
#[derive(Debug, Clone)]
pub struct PairwiseTable {
    mode: ScoringMode,
    matrices: BTreeMap<(usize, usize), PairMatrix>,
}

impl PairwiseTable {
    /// Score every slot pair `mode` needs
    ///
    /// # Arguments
    ///
    /// * `candidates` - Slots in order
    /// * `mode` - Which slot pairs contribute to an aggregate
    /// * `weights` - Score weights
    pub fn build(candidates: &[Candidate], mode: ScoringMode, weights: &ScoreWeights) -> Self {
        let matrices = mode
            .slot_pairs(candidates.len())
            .into_par_iter()
            .map(|(i, j)| {
                let a = &candidates[i].options;
                let b = &candidates[j].options;
                let values: Vec<f32> = (0..a.len() * b.len())
                    .into_par_iter()
                    .map(|idx| score(&a[idx / b.len()].profile, &b[idx % b.len()].profile, weights))
                    .collect();
                (
                    (i, j),
                    PairMatrix {
                        rows: a.len(),
                        cols: b.len(),
                        values,
                    },
                )
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        let table = Self { mode, matrices };
        log::debug!(
            "Pairwise table: {} slot pair(s), {} scores",
            table.matrices.len(),
            table.len()
        );
        table
    }

    /// Mode the table was built for
    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Slot pairs in the table, ascending
    pub fn slot_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.matrices.keys().copied()
    }

    /// Matrix for a slot pair, if the mode scores it
    pub fn matrix(&self, slot_a: usize, slot_b: usize) -> Option<&PairMatrix> {
        self.matrices.get(&(slot_a, slot_b))
    }

    /// Score between two options, in either slot order
    pub fn score(&self, slot_a: usize, option_a: usize, slot_b: usize, option_b: usize) -> Option<f32> {
        if slot_a <= slot_b {
            self.matrices
                .get(&(slot_a, slot_b))
                .map(|m| m.get(option_a, option_b))
        } else {
            self.matrices
                .get(&(slot_b, slot_a))
                .map(|m| m.get(option_b, option_a))
        }
    }

    /// Sum of the pair scores of a full selection (one option index per slot)
    pub fn combination_score(&self, selection: &[usize]) -> f32 {
        self.matrices
            .iter()
            .map(|(&(i, j), m)| m.get(selection[i], selection[j]))
            .sum()
    }

    /// Total number of stored scores
    pub fn len(&self) -> usize {
        self.matrices.values().map(|m| m.values.len()).sum()
    }

    /// True if no scores are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::candidate::CandidateOption;
    use crate::features::FeatureProfile;
    use crate::io::sample_buffer::SampleBuffer;

    fn slot(name: &str, noises: &[f32]) -> Candidate {
        let options = noises
            .iter()
            .enumerate()
            .map(|(i, &noise)| {
                let profile = FeatureProfile {
                    noise_floor_db: noise,
                    ..FeatureProfile::silent()
                };
                CandidateOption::new(
                    format!("{}-{}", name, i),
                    SampleBuffer::mono(vec![0.0; 16], 16_000).unwrap(),
                    profile,
                )
            })
            .collect();
        Candidate::new(name, options)
    }

    fn noise_only() -> ScoreWeights {
        ScoreWeights {
            noise_floor: 1.0,
            centroid: 0.0,
            level: 0.0,
            duration: 0.0,
            onset_density: 0.0,
        }
    }

    #[test]
    fn test_sequential_table_has_adjacent_pairs() {
        let slots = vec![slot("a", &[-60.0, -50.0]), slot("b", &[-55.0]), slot("c", &[-40.0, -70.0, -65.0])];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &noise_only());
        assert_eq!(table.slot_pairs().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
        assert_eq!(table.len(), 2 + 3);
        assert_eq!(table.score(0, 1, 1, 0), Some(5.0));
        assert_eq!(table.score(1, 0, 0, 1), Some(5.0));
        assert_eq!(table.score(0, 0, 2, 0), None);
        assert_eq!(table.combination_score(&[0, 0, 2]), 5.0 + 10.0);
    }

    #[test]
    fn test_layered_table_has_all_pairs() {
        let slots = vec![slot("a", &[-60.0]), slot("b", &[-50.0]), slot("c", &[-40.0])];
        let table = PairwiseTable::build(&slots, ScoringMode::Layered, &noise_only());
        assert_eq!(
            table.slot_pairs().collect::<Vec<_>>(),
            vec![(0, 1), (0, 2), (1, 2)]
        );
        assert_eq!(table.combination_score(&[0, 0, 0]), 10.0 + 20.0 + 10.0);
    }
}
