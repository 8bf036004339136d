//! Constrained assembly
//!
//! Picks one option per slot to produce up to `k` ranked assemblies such that
//! (with no-reuse) no source take appears in more than one of them.
//!
//! - Pool product at or below `exhaustive_ceiling`: exhaustive enumeration
//! - Above it: greedy chains with local improvement
//!
//! Ties are broken by pool insertion order, so results are deterministic for a
//! given input and configuration (absent a wall-clock budget).

pub mod budget;
pub mod candidate;
pub mod result;
mod search;
pub mod used_set;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scoring::pairwise::PairwiseTable;
use crate::scoring::{ScoreWeights, ScoringMode};

pub use budget::SearchBudget;
pub use candidate::{Candidate, CandidateOption, SourceId};
pub use result::{Assembly, AssemblyOutcome, AssemblyPart, PairScore, SearchStrategy, Shortage};
pub use used_set::UsedSet;

use budget::BudgetTracker;
use search::{exhaustive, greedy, Scored, SearchContext};

/// Assembler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How pair scores combine (default: Sequential)
    pub mode: ScoringMode,

    /// Score weights (default: the splice preset)
    pub weights: ScoreWeights,

    /// Largest pool product searched exhaustively (default: 250000)
    pub exhaustive_ceiling: u64,

    /// Combinations scored per parallel chunk (default: 4096)
    pub chunk_size: usize,

    /// Local improvement passes per greedy chain (default: 8)
    pub max_improvement_passes: usize,

    /// Options below this RMS level are penalized (default: -40.0 dBFS)
    pub quiet_level_db: f32,

    /// Penalty per quiet option (default: 3.0)
    pub quiet_penalty: f32,

    /// Optional work limits (default: unlimited)
    pub budget: SearchBudget,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Sequential,
            weights: ScoreWeights::splice(),
            exhaustive_ceiling: 250_000,
            chunk_size: 4096,
            max_improvement_passes: 8,
            quiet_level_db: -40.0,
            quiet_penalty: 3.0,
            budget: SearchBudget::unlimited(),
        }
    }
}

impl SearchConfig {
    /// Layered preset: all-pairs scoring with the cross-layer weights
    pub fn layered() -> Self {
        Self {
            mode: ScoringMode::Layered,
            weights: ScoreWeights::cross_layer(),
            ..Self::default()
        }
    }
}

/// Search for the `k` best assemblies
///
/// # Arguments
///
/// * `candidates` - Slots in output order, each with a non-empty pool
/// * `k` - Number of assemblies wanted
/// * `no_reuse` - Reject assemblies sharing a source with `used` (and each other)
/// * `used` - Sources already committed; accepted sources are added
/// * `config` - Search configuration
///
/// # Returns
///
/// Accepted assemblies sorted by aggregate score, plus a [`Shortage`] when
/// fewer than `k` exist under the constraints
///
/// # Errors
///
/// - `EngineError::InvalidWeightConfiguration` if the weights are invalid
/// - `EngineError::InvalidInput` for no slots, an empty pool, or options
///   that differ in sample rate or channel count
///
/// # Example
///
/// ```
/// use stratum_splice::assembly::{assemble, Candidate, CandidateOption, SearchConfig, UsedSet};
/// use stratum_splice::features::{profile, ProfileConfig};
/// use stratum_splice::SampleBuffer;
///
/// let option = |id: &str, level: f32| {
///     let buffer = SampleBuffer::mono(vec![level; 8000], 16_000).unwrap();
///     let features = profile(&buffer, &ProfileConfig::default());
///     CandidateOption::new(id, buffer, features)
/// };
/// let slots = vec![
///     Candidate::new("hello", vec![option("h1", 0.1), option("h2", 0.2)]),
///     Candidate::new("world", vec![option("w1", 0.1), option("w2", 0.2)]),
/// ];
///
/// let mut used = UsedSet::new();
/// let outcome = assemble(&slots, 2, true, &mut used, &SearchConfig::default())?;
/// assert_eq!(outcome.len(), 2);
/// assert_eq!(used.len(), 4);
/// # Ok::<(), stratum_splice::EngineError>(())
/// ```
pub fn assemble(
    candidates: &[Candidate],
    k: usize,
    no_reuse: bool,
    used: &mut UsedSet,
    config: &SearchConfig,
) -> Result<AssemblyOutcome, EngineError> {
    config.weights.validate()?;

    if candidates.is_empty() {
        return Err(EngineError::invalid_input("no slots to assemble"));
    }
    if let Some(empty) = candidates.iter().find(|c| c.is_empty()) {
        return Err(EngineError::invalid_input(format!(
            "slot '{}' has no options",
            empty.name
        )));
    }
    check_layout(candidates)?;

    let product = candidates
        .iter()
        .try_fold(1u64, |acc, c| acc.checked_mul(c.len() as u64));
    let exhaustive_total = product
        .filter(|&p| p <= config.exhaustive_ceiling)
        .and_then(|p| usize::try_from(p).ok());
    let strategy = if exhaustive_total.is_some() {
        SearchStrategy::Exhaustive
    } else {
        SearchStrategy::Greedy
    };

    if k == 0 {
        return Ok(AssemblyOutcome {
            assemblies: Vec::new(),
            requested: 0,
            shortage: None,
            strategy,
            combinations_considered: 0,
            budget_exhausted: false,
        });
    }

    log::debug!(
        "Assembling {} slot(s), {} combination(s), k={}, no_reuse={}, {:?} via {:?}",
        candidates.len(),
        product.map_or_else(|| "overflowing".to_string(), |p| p.to_string()),
        k,
        no_reuse,
        config.mode,
        strategy
    );

    let table = PairwiseTable::build(candidates, config.mode, &config.weights);
    let ctx = SearchContext::new(candidates, &table, config.quiet_level_db, config.quiet_penalty);
    let mut tracker = BudgetTracker::start(config.budget);

    let result = match exhaustive_total {
        Some(total) => exhaustive(&ctx, total, k, no_reuse, used, &mut tracker, config.chunk_size),
        None => greedy(
            &ctx,
            k,
            no_reuse,
            used,
            &mut tracker,
            config.max_improvement_passes,
        ),
    };

    let mut assemblies: Vec<Assembly> = result
        .accepted
        .iter()
        .map(|scored| build_assembly(candidates, &table, &ctx, scored, config.mode))
        .collect();
    assemblies.sort_by(|a, b| a.aggregate_score.total_cmp(&b.aggregate_score));
    for (i, assembly) in assemblies.iter_mut().enumerate() {
        assembly.rank = i + 1;
    }

    let shortage = (assemblies.len() < k).then(|| Shortage {
        requested: k,
        found: assemblies.len(),
    });
    if let Some(s) = shortage {
        log::warn!(
            "Only {} of {} requested assemblies satisfy the constraints",
            s.found,
            s.requested
        );
    }

    log::debug!(
        "Accepted {} assembl{} after {} combination(s); best score {:?}",
        assemblies.len(),
        if assemblies.len() == 1 { "y" } else { "ies" },
        tracker.considered(),
        assemblies.first().map(|a| a.aggregate_score)
    );

    Ok(AssemblyOutcome {
        assemblies,
        requested: k,
        shortage,
        strategy,
        combinations_considered: tracker.considered(),
        budget_exhausted: result.budget_exhausted,
    })
}

/// Every option must share the first option's rate and channel count, so
/// nothing is committed to the used set that could not be rendered
fn check_layout(candidates: &[Candidate]) -> Result<(), EngineError> {
    let mut options = candidates
        .iter()
        .flat_map(|c| c.options.iter().map(move |o| (c, o)));
    let Some((_, first)) = options.next() else {
        return Ok(());
    };
    let (rate, channels) = (first.buffer.sample_rate(), first.buffer.channels());
    for (candidate, option) in options {
        if option.buffer.sample_rate() != rate || option.buffer.channels() != channels {
            return Err(EngineError::invalid_input(format!(
                "option '{}' of slot '{}' is {} Hz / {} ch, expected {} Hz / {} ch",
                option.source_id,
                candidate.name,
                option.buffer.sample_rate(),
                option.buffer.channels(),
                rate,
                channels
            )));
        }
    }
    Ok(())
}

fn build_assembly(
    candidates: &[Candidate],
    table: &PairwiseTable,
    ctx: &SearchContext<'_>,
    scored: &Scored,
    mode: ScoringMode,
) -> Assembly {
    let parts = scored
        .selection
        .iter()
        .zip(candidates)
        .map(|(&index, candidate)| {
            let option = &candidate.options[index];
            AssemblyPart {
                slot: candidate.name.clone(),
                source_id: option.source_id.clone(),
                option_index: index,
                buffer: option.buffer.clone(),
                profile: option.profile,
                gap_scale: candidate.gap_scale,
            }
        })
        .collect();

    let pair_scores = table
        .slot_pairs()
        .filter_map(|(a, b)| {
            table
                .score(a, scored.selection[a], b, scored.selection[b])
                .map(|score| PairScore {
                    slot_a: a,
                    slot_b: b,
                    score,
                })
        })
        .collect();

    Assembly {
        rank: 0,
        parts,
        aggregate_score: scored.total,
        pair_scores,
        penalty: ctx.penalty(&scored.selection),
        mode,
    }
}

/// Runs several searches against one shared [`UsedSet`]
///
/// Useful when a run assembles multiple phrases and no take may appear twice
/// across all of them.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: SearchConfig,
    used: UsedSet,
}

impl Assembler {
    /// Create an assembler with an empty used set
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            used: UsedSet::new(),
        }
    }

    /// Start from an existing used set
    pub fn with_used_set(mut self, used: UsedSet) -> Self {
        self.used = used;
        self
    }

    /// Search configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Sources committed so far
    pub fn used_set(&self) -> &UsedSet {
        &self.used
    }

    /// Assemble against the shared used set
    ///
    /// # Errors
    ///
    /// See [`assemble`]
    pub fn assemble(
        &mut self,
        candidates: &[Candidate],
        k: usize,
        no_reuse: bool,
    ) -> Result<AssemblyOutcome, EngineError> {
        assemble(candidates, k, no_reuse, &mut self.used, &self.config)
    }

    /// Consume the assembler, returning the used set
    pub fn into_used_set(self) -> UsedSet {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureProfile;
    use crate::io::sample_buffer::SampleBuffer;

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

    #[test]
    fn test_k_zero_returns_empty() {
        let slots = vec![slot("a", &[-60.0])];
        let outcome = assemble(&slots, 0, true, &mut UsedSet::new(), &SearchConfig::default()).unwrap();
        assert!(outcome.is_empty());
        assert!(outcome.shortage.is_none());
    }

    #[test]
    fn test_empty_inputs_are_invalid() {
        let config = SearchConfig::default();
        assert!(matches!(
            assemble(&[], 1, true, &mut UsedSet::new(), &config),
            Err(EngineError::InvalidInput(_))
        ));
        let slots = vec![slot("a", &[-60.0]), slot("b", &[])];
        assert!(matches!(
            assemble(&slots, 1, true, &mut UsedSet::new(), &config),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mixed_layouts_are_rejected_before_search() {
        let mut slots = vec![slot("a", &[-60.0]), slot("b", &[-60.0, -55.0])];
        slots[1].options[1].buffer = SampleBuffer::mono(vec![0.0; 8], 44_100).unwrap();
        let mut used = UsedSet::new();
        assert!(matches!(
            assemble(&slots, 1, true, &mut used, &SearchConfig::default()),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(used.is_empty());

        slots[1].options[1].buffer = SampleBuffer::new(vec![0.0; 16], 2, 16_000).unwrap();
        assert!(assemble(&slots, 1, true, &mut used, &SearchConfig::default()).is_err());
        assert!(used.is_empty());
    }

    #[test]
    fn test_invalid_weights_are_fatal() {
        let config = SearchConfig {
            weights: ScoreWeights {
                noise_floor: -1.0,
                ..ScoreWeights::splice()
            },
            ..SearchConfig::default()
        };
        let slots = vec![slot("a", &[-60.0])];
        let err = assemble(&slots, 1, true, &mut UsedSet::new(), &config).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_quiet_options_are_penalized() {
        let mut slots = vec![slot("a", &[-60.0, -60.0]), slot("b", &[-60.0])];
        slots[0].options[0].profile.level_db = -55.0;
        let outcome = assemble(&slots, 1, true, &mut UsedSet::new(), &SearchConfig::default()).unwrap();
        let best = outcome.best().unwrap();
        assert_eq!(best.parts[0].source_id.as_str(), "a1");
        assert_eq!(best.penalty, 0.0);
    }

    #[test]
    fn test_greedy_used_above_ceiling() {
        let slots = vec![
            slot("a", &[-60.0, -50.0, -40.0]),
            slot("b", &[-58.0, -49.0, -41.0]),
            slot("c", &[-61.0, -51.0, -39.0]),
        ];
        let config = SearchConfig {
            exhaustive_ceiling: 10,
            ..SearchConfig::default()
        };
        let mut used = UsedSet::new();
        let outcome = assemble(&slots, 3, true, &mut used, &config).unwrap();
        assert_eq!(outcome.strategy, SearchStrategy::Greedy);
        assert_eq!(outcome.len(), 3);
        assert!(outcome.shortage.is_none());
        assert_eq!(used.len(), 9);
        assert!(outcome
            .assemblies
            .windows(2)
            .all(|w| w[0].aggregate_score <= w[1].aggregate_score));
    }

    #[test]
    fn test_assembler_shares_used_set_across_calls() {
        let slots = vec![slot("a", &[-60.0, -50.0]), slot("b", &[-58.0, -49.0])];
        let mut assembler = Assembler::new(SearchConfig::default());
        let first = assembler.assemble(&slots, 1, true).unwrap();
        let second = assembler.assemble(&slots, 5, true).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second.shortage, Some(Shortage { requested: 5, found: 1 }));
        let third = assembler.assemble(&slots, 1, true).unwrap();
        assert!(third.is_empty());
        assert_eq!(assembler.used_set().len(), 4);
    }
}
