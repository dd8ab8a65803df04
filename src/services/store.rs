//! Session Store
//!
//! Process-wide state shared by the retrieval flows: the in-flight request
//! map, the analysis admission slot and the review cache. Constructed once at startup and passed by
//! handle; tests build isolated instances.
//!
//! The review cache is a `mini_moka::sync::Cache` without a capacity or TTL,
//! so entries live for the session and are never evicted.

use std::sync::{Arc, Mutex, MutexGuard};

use mini_moka::sync::{Cache, ConcurrentCacheExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use aspirepath_client::RequestDeduplicator;
use aspirepath_core::{AnalysisSource, ReviewRecord};

/// Where a resolved review came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSource {
    /// Matched to the profile by the reviews backend.
    Relevant,
    /// Any review the backend had.
    Random,
    /// Built locally from the program name.
    Synthesized,
}

/// Cached resolution of one review lookup. `review` is `None` for the
/// explicit empty state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub review: Option<ReviewRecord>,
    pub source: Option<ReviewSource>,
    pub error: Option<String>,
}

impl CacheEntry {
    pub fn found(review: ReviewRecord, source: ReviewSource) -> Self {
        Self {
            review: Some(review),
            source: Some(source),
            error: None,
        }
    }

    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            review: None,
            source: None,
            error: Some(error.into()),
        }
    }
}

/// Review cache keyed by [`aspirepath_core::ProfileData::cache_key`].
#[derive(Clone)]
pub struct ReviewCache {
    inner: Cache<String, CacheEntry>,
}

impl ReviewCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(&key.to_owned())
    }

    /// Last write wins.
    pub fn insert(&self, key: String, entry: CacheEntry) {
        self.inner.insert(key, entry);
    }

    pub fn len(&self) -> u64 {
        self.inner.sync();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.sync();
    }
}

impl Default for ReviewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReviewCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[derive(Debug)]
struct ActiveAnalysis {
    source: AnalysisSource,
    holders: usize,
}

/// Admission for analyses across every flow of a session.
///
/// One analysis runs at a time. Flows submitting the same source while it
/// runs share the claim and join the in-flight request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSlot {
    active: Arc<Mutex<Option<ActiveAnalysis>>>,
}

impl AnalysisSlot {
    /// Claim the slot for `source`, or `None` while a different analysis runs.
    pub fn claim(&self, source: &AnalysisSource) -> Option<AnalysisClaim> {
        let mut active = self.lock();
        match active.as_mut() {
            Some(running) if running.source == *source => running.holders += 1,
            Some(_) => return None,
            None => {
                *active = Some(ActiveAnalysis {
                    source: source.clone(),
                    holders: 1,
                })
            }
        }
        Some(AnalysisClaim { slot: self.clone() })
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveAnalysis>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A hold on the [`AnalysisSlot`]. Released on drop.
#[derive(Debug)]
pub struct AnalysisClaim {
    slot: AnalysisSlot,
}

impl Drop for AnalysisClaim {
    fn drop(&mut self) {
        let mut active = self.slot.lock();
        if let Some(running) = active.as_mut() {
            running.holders = running.holders.saturating_sub(1);
            if running.holders == 0 {
                *active = None;
            }
        }
    }
}

/// Shared session state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    dedup: Arc<RequestDeduplicator<Value>>,
    analysis: AnalysisSlot,
    reviews: ReviewCache,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dedup(&self) -> Arc<RequestDeduplicator<Value>> {
        Arc::clone(&self.dedup)
    }

    pub fn analysis_slot(&self) -> &AnalysisSlot {
        &self.analysis
    }

    pub fn reviews(&self) -> &ReviewCache {
        &self.reviews
    }
}
