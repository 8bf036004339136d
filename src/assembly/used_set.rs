//! Sources already committed to accepted assemblies
//!
//! The set only grows during a run. It is threaded explicitly through the
//! search (or owned by an [`Assembler`](super::Assembler)) and mutated only in
//! the single-threaded acceptance step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::candidate::SourceId;

/// Monotonically growing set of used source ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedSet {
    sources: BTreeSet<SourceId>,
}

impl UsedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `id` is already used
    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.contains(id)
    }

    /// True if any of `ids` is already used
    pub fn contains_any<'a>(&self, mut ids: impl Iterator<Item = &'a SourceId>) -> bool {
        ids.any(|id| self.sources.contains(id))
    }

    /// Mark a source as used; returns false if it already was
    pub fn insert(&mut self, id: SourceId) -> bool {
        self.sources.insert(id)
    }

    /// Number of used sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if nothing has been used yet
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Used sources in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &SourceId> {
        self.sources.iter()
    }
}

impl Extend<SourceId> for UsedSet {
    fn extend<T: IntoIterator<Item = SourceId>>(&mut self, iter: T) {
        self.sources.extend(iter);
    }
}

impl FromIterator<SourceId> for UsedSet {
    fn from_iter<T: IntoIterator<Item = SourceId>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}
