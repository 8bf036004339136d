//! Optional search budget
//!
//! The budget is the only cancellation mechanism. It is checked between
//! enumeration chunks and greedy rounds, never mid-chunk, so the search always
//! stops on a consistent partial result.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Limits on how much work a search may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum number of full combinations scored (default: unlimited)
    pub max_combinations: Option<u64>,

    /// Maximum wall-clock time in milliseconds (default: unlimited)
    pub max_duration_ms: Option<u64>,
}

impl SearchBudget {
    /// No limits
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// True if neither limit is set
    pub fn is_unlimited(&self) -> bool {
        self.max_combinations.is_none() && self.max_duration_ms.is_none()
    }
}

/// Running account against a [`SearchBudget`]
#[derive(Debug)]
pub(crate) struct BudgetTracker {
    budget: SearchBudget,
    started: Instant,
    considered: u64,
}

impl BudgetTracker {
    pub(crate) fn start(budget: SearchBudget) -> Self {
        Self {
            budget,
            started: Instant::now(),
            considered: 0,
        }
    }

    pub(crate) fn record(&mut self, combinations: u64) {
        self.considered = self.considered.saturating_add(combinations);
    }

    pub(crate) fn considered(&self) -> u64 {
        self.considered
    }

    /// Combinations still allowed before the count limit is hit
    pub(crate) fn remaining_combinations(&self) -> Option<u64> {
        self.budget
            .max_combinations
            .map(|max| max.saturating_sub(self.considered))
    }

    pub(crate) fn exhausted(&self) -> bool {
        if let Some(max) = self.budget.max_combinations {
            if self.considered >= max {
                return true;
            }
        }
        if let Some(ms) = self.budget.max_duration_ms {
            if self.started.elapsed() >= Duration::from_millis(ms) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_limit() {
        let mut tracker = BudgetTracker::start(SearchBudget {
            max_combinations: Some(10),
            max_duration_ms: None,
        });
        tracker.record(6);
        assert!(!tracker.exhausted());
        assert_eq!(tracker.remaining_combinations(), Some(4));
        tracker.record(4);
        assert!(tracker.exhausted());
    }

    #[test]
    fn test_zero_duration_is_immediately_exhausted() {
        let tracker = BudgetTracker::start(SearchBudget {
            max_combinations: None,
            max_duration_ms: Some(0),
        });
        assert!(tracker.exhausted());
    }

    #[test]
    fn test_unlimited_never_exhausts() {
        let mut tracker = BudgetTracker::start(SearchBudget::unlimited());
        tracker.record(u64::MAX);
        assert!(!tracker.exhausted());
        assert_eq!(tracker.remaining_combinations(), None);
    }
}
