//! Read-through profile cache keyed by content fingerprint
//!
//! Profiles are pure functions of buffer content, so concurrent writers racing
//! on the same key store identical values and the race is harmless.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rayon::prelude::*;

use super::profile::{profile, FeatureProfile, ProfileConfig};
use crate::io::sample_buffer::{Fingerprint, SampleBuffer};

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that computed a profile
    pub misses: u64,
}

/// Thread-safe profile cache
#[derive(Debug, Default)]
pub struct ProfileCache {
    config: ProfileConfig,
    entries: RwLock<HashMap<Fingerprint, FeatureProfile>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProfileCache {
    /// Create an empty cache that profiles with `config`
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration used for cache misses
    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Look up a profile without computing it
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<FeatureProfile> {
        self.entries.read().get(fingerprint).copied()
    }

    /// Return the cached profile for `buffer`, computing and storing it on a miss
    pub fn get_or_profile(&self, buffer: &SampleBuffer) -> FeatureProfile {
        let fingerprint = buffer.fingerprint();
        if let Some(cached) = self.get(&fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = profile(buffer, &self.config);
        *self.entries.write().entry(fingerprint).or_insert(computed)
    }

    /// Profile many buffers in parallel, preserving input order
    pub fn profile_all(&self, buffers: &[SampleBuffer]) -> Vec<FeatureProfile> {
        buffers
            .par_iter()
            .map(|buffer| self.get_or_profile(buffer))
            .collect()
    }

    /// Number of cached profiles
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop all cached profiles and reset counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
