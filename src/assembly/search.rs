//! Combination search
//!
//! Two strategies share one scoring context:
//! - Exhaustive: enumerate every combination in mixed-radix order (last slot
//!   fastest), score chunks in parallel, sort by (score, enumeration index),
//!   then accept in order under the no-reuse rule.
//! - Greedy: for every available first option build a chain by choosing the
//!   cheapest next option, refine it with best-improvement single-slot swaps,
//!   and accept the best chain. Repeat with the now smaller pools until `k`
//!   assemblies are accepted or a pool runs dry.
//!
//! In both, the used set is mutated only in the sequential acceptance step.

use std::collections::HashSet;

use rayon::prelude::*;

use super::budget::BudgetTracker;
use super::candidate::{Candidate, SourceId};
use super::used_set::UsedSet;
use crate::scoring::pairwise::PairwiseTable;

/// A scored selection: one option index per slot
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scored {
    pub selection: Vec<usize>,
    pub total: f32,
}

/// Accepted selections plus whether the budget cut the search short
#[derive(Debug)]
pub(crate) struct SearchResult {
    pub accepted: Vec<Scored>,
    pub budget_exhausted: bool,
}

/// Everything a strategy needs to score selections
pub(crate) struct SearchContext<'a> {
    candidates: &'a [Candidate],
    table: &'a PairwiseTable,
    penalties: Vec<Vec<f32>>,
}

impl<'a> SearchContext<'a> {
    /// `quiet_level_db`/`quiet_penalty`: options quieter than the level add the penalty
    pub(crate) fn new(
        candidates: &'a [Candidate],
        table: &'a PairwiseTable,
        quiet_level_db: f32,
        quiet_penalty: f32,
    ) -> Self {
        let penalties = candidates
            .iter()
            .map(|c| {
                c.options
                    .iter()
                    .map(|o| {
                        if o.profile.level_db < quiet_level_db {
                            quiet_penalty
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            candidates,
            table,
            penalties,
        }
    }

    fn source(&self, slot: usize, option: usize) -> &SourceId {
        &self.candidates[slot].options[option].source_id
    }

    /// Penalty part of a selection's aggregate
    pub(crate) fn penalty(&self, selection: &[usize]) -> f32 {
        selection
            .iter()
            .enumerate()
            .map(|(slot, &option)| self.penalties[slot][option])
            .sum()
    }

    /// Aggregate score: pair scores plus quiet penalties
    pub(crate) fn total(&self, selection: &[usize]) -> f32 {
        self.table.combination_score(selection) + self.penalty(selection)
    }

    fn has_internal_duplicate(&self, selection: &[usize]) -> bool {
        let mut seen = HashSet::with_capacity(selection.len());
        !selection
            .iter()
            .enumerate()
            .all(|(slot, &option)| seen.insert(self.source(slot, option)))
    }

    /// Accept `selection` if it respects the reuse rules, recording its sources
    fn try_accept(&self, selection: &[usize], no_reuse: bool, used: &mut UsedSet) -> bool {
        if self.has_internal_duplicate(selection) {
            return false;
        }
        let sources = selection
            .iter()
            .enumerate()
            .map(|(slot, &option)| self.source(slot, option));
        if no_reuse && used.contains_any(sources) {
            return false;
        }
        for (slot, &option) in selection.iter().enumerate() {
            used.insert(self.source(slot, option).clone());
        }
        true
    }

    /// True if option `option` of `slot` may be used next to the rest of `selection`
    fn fits(&self, selection: &[usize], slot: usize, option: usize) -> bool {
        let id = self.source(slot, option);
        selection
            .iter()
            .enumerate()
            .all(|(other, &chosen)| other == slot || self.source(other, chosen) != id)
    }
}

fn decode(mut index: usize, radices: &[usize], selection: &mut [usize]) {
    for (slot, &radix) in radices.iter().enumerate().rev() {
        selection[slot] = index % radix;
        index /= radix;
    }
}

/// Exhaustive strategy; `total` is the product of pool sizes
pub(crate) fn exhaustive(
    ctx: &SearchContext<'_>,
    total: usize,
    k: usize,
    no_reuse: bool,
    used: &mut UsedSet,
    tracker: &mut BudgetTracker,
    chunk_size: usize,
) -> SearchResult {
    let radices: Vec<usize> = ctx.candidates.iter().map(|c| c.options.len()).collect();
    let chunk_size = chunk_size.max(1);

    let mut scored: Vec<(f32, usize)> = Vec::with_capacity(total);
    let mut next = 0usize;
    let mut budget_exhausted = false;

    while next < total {
        if tracker.exhausted() {
            budget_exhausted = true;
            break;
        }
        let mut end = next.saturating_add(chunk_size).min(total);
        if let Some(remaining) = tracker.remaining_combinations() {
            end = end.min(next.saturating_add(remaining as usize));
        }

        let chunk: Vec<(f32, usize)> = (next..end)
            .into_par_iter()
            .map_init(
                || vec![0usize; radices.len()],
                |selection, index| {
                    decode(index, &radices, selection);
                    (ctx.total(selection), index)
                },
            )
            .collect();

        tracker.record((end - next) as u64);
        scored.extend(chunk);
        next = end;
    }

    if budget_exhausted {
        log::warn!(
            "Search budget exhausted after {} of {} combinations",
            next,
            total
        );
    }

    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut accepted = Vec::with_capacity(k.min(scored.len()));
    let mut selection = vec![0usize; radices.len()];
    for (score, index) in scored {
        if accepted.len() >= k {
            break;
        }
        decode(index, &radices, &mut selection);
        if ctx.try_accept(&selection, no_reuse, used) {
            accepted.push(Scored {
                selection: selection.clone(),
                total: score,
            });
        }
    }

    SearchResult {
        accepted,
        budget_exhausted,
    }
}

/// Options per slot that the no-reuse rule still allows
fn available_options(ctx: &SearchContext<'_>, no_reuse: bool, used: &UsedSet) -> Vec<Vec<bool>> {
    ctx.candidates
        .iter()
        .map(|c| {
            c.options
                .iter()
                .map(|o| !(no_reuse && used.contains(&o.source_id)))
                .collect()
        })
        .collect()
}

/// Cheapest single-slot change of `selection`
///
/// Only moves to available, source-distinct, not yet emitted selections are
/// considered. With `bound`, only strictly cheaper selections qualify. Ties go
/// to the earliest slot, then the earliest option.
fn best_swap(
    ctx: &SearchContext<'_>,
    selection: &[usize],
    available: &[Vec<bool>],
    emitted: &HashSet<Vec<usize>>,
    bound: Option<f32>,
) -> (Option<Scored>, u64) {
    let mut best: Option<Scored> = None;
    let mut considered = 0u64;
    let mut trial = selection.to_vec();

    for slot in 0..selection.len() {
        for option in 0..available[slot].len() {
            if option == selection[slot] || !available[slot][option] || !ctx.fits(selection, slot, option) {
                continue;
            }
            trial[slot] = option;
            if !emitted.contains(&trial) {
                let total = ctx.total(&trial);
                considered += 1;
                let beats_bound = bound.map_or(true, |b| total < b);
                let beats_best = best.as_ref().map_or(true, |s| total < s.total);
                if beats_bound && beats_best {
                    best = Some(Scored {
                        selection: trial.clone(),
                        total,
                    });
                }
            }
            trial[slot] = selection[slot];
        }
    }

    (best, considered)
}

/// Greedy chain from `start` in slot 0, then local improvement
fn seed_and_improve(
    ctx: &SearchContext<'_>,
    start: usize,
    available: &[Vec<bool>],
    emitted: &HashSet<Vec<usize>>,
    max_passes: usize,
) -> (Option<Scored>, u64) {
    let slots = available.len();
    let mut selection = Vec::with_capacity(slots);
    selection.push(start);

    for slot in 1..slots {
        let mut best: Option<(f32, usize)> = None;
        for option in 0..available[slot].len() {
            if !available[slot][option] || !ctx.fits(&selection, slot, option) {
                continue;
            }
            let cost: f32 = selection
                .iter()
                .enumerate()
                .filter_map(|(prev, &chosen)| ctx.table.score(prev, chosen, slot, option))
                .sum::<f32>()
                + ctx.penalties[slot][option];
            if best.map_or(true, |(c, _)| cost < c) {
                best = Some((cost, option));
            }
        }
        match best {
            Some((_, option)) => selection.push(option),
            None => return (None, 0),
        }
    }

    let mut considered = 1u64;
    let mut current = Scored {
        total: ctx.total(&selection),
        selection,
    };

    if emitted.contains(&current.selection) {
        // Step off an already accepted selection to its best neighbour
        let (neighbour, n) = best_swap(ctx, &current.selection, available, emitted, None);
        considered += n;
        match neighbour {
            Some(next) => current = next,
            None => return (None, considered),
        }
    }

    for _ in 0..max_passes {
        let (better, n) = best_swap(ctx, &current.selection, available, emitted, Some(current.total));
        considered += n;
        match better {
            Some(next) => current = next,
            None => break,
        }
    }

    (Some(current), considered)
}

/// Greedy strategy with local improvement
pub(crate) fn greedy(
    ctx: &SearchContext<'_>,
    k: usize,
    no_reuse: bool,
    used: &mut UsedSet,
    tracker: &mut BudgetTracker,
    max_passes: usize,
) -> SearchResult {
    let mut accepted: Vec<Scored> = Vec::new();
    let mut emitted: HashSet<Vec<usize>> = HashSet::new();
    let mut budget_exhausted = false;

    while accepted.len() < k {
        if tracker.exhausted() {
            budget_exhausted = true;
            log::warn!(
                "Search budget exhausted after {} greedy round(s)",
                accepted.len()
            );
            break;
        }

        let available = available_options(ctx, no_reuse, used);
        if available.iter().any(|slot| !slot.iter().any(|&a| a)) {
            log::debug!("Greedy search stopped: a slot has no unused options left");
            break;
        }

        let starts: Vec<usize> = (0..available[0].len()).filter(|&o| available[0][o]).collect();
        let rounds: Vec<(Option<Scored>, u64)> = starts
            .par_iter()
            .map(|&start| seed_and_improve(ctx, start, &available, &emitted, max_passes))
            .collect();

        tracker.record(rounds.iter().map(|(_, n)| n).sum());

        let best = rounds
            .into_iter()
            .filter_map(|(scored, _)| scored)
            .min_by(|a, b| {
                a.total
                    .total_cmp(&b.total)
                    .then_with(|| a.selection.cmp(&b.selection))
            });

        match best {
            Some(scored) => {
                if !ctx.try_accept(&scored.selection, no_reuse, used) {
                    // Chains are built from available, distinct sources only
                    log::warn!("Greedy selection {:?} violated reuse rules", scored.selection);
                    break;
                }
                emitted.insert(scored.selection.clone());
                accepted.push(scored);
            }
            None => break,
        }
    }

    SearchResult {
        accepted,
        budget_exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::budget::SearchBudget;
    use crate::assembly::candidate::CandidateOption;
    use crate::features::FeatureProfile;
    use crate::io::sample_buffer::SampleBuffer;
    use crate::scoring::{ScoreWeights, ScoringMode};

    fn slot(name: &str, noises: &[f32]) -> Candidate {
        let options = noises
            .iter()
            .enumerate()
            .map(|(i, &noise)| {
                CandidateOption::new(
                    format!("{}{}", name, i),
                    SampleBuffer::mono(vec![0.0; 8], 16_000).unwrap(),
                    FeatureProfile {
                        noise_floor_db: noise,
                        level_db: -20.0,
                        ..FeatureProfile::silent()
                    },
                )
            })
            .collect();
        Candidate::new(name, options)
    }

    fn weights() -> ScoreWeights {
        ScoreWeights {
            noise_floor: 1.0,
            centroid: 0.0,
            level: 0.0,
            duration: 0.0,
            onset_density: 0.0,
        }
    }

    #[test]
    fn test_decode_is_lexicographic() {
        let mut selection = vec![0; 3];
        decode(5, &[2, 2, 3], &mut selection);
        assert_eq!(selection, vec![0, 1, 2]);
        decode(6, &[2, 2, 3], &mut selection);
        assert_eq!(selection, vec![1, 0, 0]);
    }

    #[test]
    fn test_exhaustive_and_greedy_agree_on_best() {
        let slots = vec![
            slot("a", &[-60.0, -40.0, -52.0]),
            slot("b", &[-45.0, -58.0]),
            slot("c", &[-41.0, -59.0, -70.0]),
        ];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &weights());
        let ctx = SearchContext::new(&slots, &table, -40.0, 3.0);

        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let full = exhaustive(&ctx, 18, 1, true, &mut used, &mut tracker, 4);

        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let quick = greedy(&ctx, 1, true, &mut used, &mut tracker, 8);

        assert_eq!(full.accepted[0].selection, vec![0, 1, 1]);
        assert_eq!(quick.accepted[0], full.accepted[0]);
    }

    #[test]
    fn test_equal_scores_resolve_by_insertion_order() {
        let slots = vec![slot("a", &[-60.0; 3]), slot("b", &[-60.0; 3])];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &weights());
        let ctx = SearchContext::new(&slots, &table, -40.0, 3.0);
        let expected = vec![vec![0, 0], vec![1, 1], vec![2, 2]];

        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let full = exhaustive(&ctx, 9, 3, true, &mut used, &mut tracker, 4);
        let order: Vec<Vec<usize>> = full.accepted.iter().map(|s| s.selection.clone()).collect();
        assert_eq!(order, expected);

        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let quick = greedy(&ctx, 3, true, &mut used, &mut tracker, 8);
        let order: Vec<Vec<usize>> = quick.accepted.iter().map(|s| s.selection.clone()).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_equal_scores_without_reuse_rule_follow_enumeration() {
        let slots = vec![slot("a", &[-60.0; 2]), slot("b", &[-60.0; 2])];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &weights());
        let ctx = SearchContext::new(&slots, &table, -40.0, 3.0);
        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let full = exhaustive(&ctx, 4, 4, false, &mut used, &mut tracker, 3);
        let order: Vec<Vec<usize>> = full.accepted.iter().map(|s| s.selection.clone()).collect();
        assert_eq!(order, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn test_exhaustive_budget_stops_between_chunks() {
        let slots = vec![slot("a", &[-60.0; 4]), slot("b", &[-60.0; 4])];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &weights());
        let ctx = SearchContext::new(&slots, &table, -40.0, 3.0);
        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget {
            max_combinations: Some(5),
            max_duration_ms: None,
        });
        let result = exhaustive(&ctx, 16, 16, false, &mut used, &mut tracker, 2);
        assert!(result.budget_exhausted);
        assert_eq!(tracker.considered(), 5);
        assert_eq!(result.accepted.len(), 5);
    }

    #[test]
    fn test_internal_duplicates_are_rejected() {
        let mut shared = slot("x", &[-60.0]);
        shared.options[0].source_id = SourceId::from("same");
        let mut other = slot("y", &[-60.0, -61.0]);
        other.options[0].source_id = SourceId::from("same");
        let slots = vec![shared, other];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &weights());
        let ctx = SearchContext::new(&slots, &table, -40.0, 3.0);
        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let result = exhaustive(&ctx, 2, 5, false, &mut used, &mut tracker, 64);
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].selection, vec![0, 1]);
    }

    #[test]
    fn test_greedy_without_no_reuse_yields_distinct_selections() {
        let slots = vec![slot("a", &[-60.0, -61.0]), slot("b", &[-60.0, -62.0])];
        let table = PairwiseTable::build(&slots, ScoringMode::Sequential, &weights());
        let ctx = SearchContext::new(&slots, &table, -40.0, 3.0);
        let mut used = UsedSet::new();
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        let result = greedy(&ctx, 3, false, &mut used, &mut tracker, 4);
        let unique: HashSet<Vec<usize>> = result.accepted.iter().map(|s| s.selection.clone()).collect();
        assert_eq!(unique.len(), result.accepted.len());
        assert!(result.accepted.len() >= 2);
        assert_eq!(result.accepted[0].selection, vec![0, 0]);
    }
}
