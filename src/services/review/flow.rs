//! Review Flow
//!
//! Each lookup step is bounded by the review timeout. Failures are logged and
//! move the lookup to the next step; they never reach the caller as errors.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use aspirepath_client::CareerApi;
use aspirepath_core::{ProfileData, ReviewRecord};

use super::synthesize::synthesize_review;
use super::{ReviewOutcome, ReviewPhase};
use crate::services::store::{CacheEntry, ReviewCache, ReviewSource};

/// Error recorded for the explicit empty state.
pub const NO_REVIEW_AVAILABLE: &str = "No review available";

/// Default bound on each review lookup step.
pub const DEFAULT_REVIEW_TIMEOUT: Duration = Duration::from_secs(15);

/// Review lookups for one session.
#[derive(Clone)]
pub struct ReviewFlow {
    api: Arc<CareerApi>,
    cache: ReviewCache,
    timeout: Duration,
}

impl ReviewFlow {
    pub fn new(api: Arc<CareerApi>, cache: ReviewCache) -> Self {
        Self {
            api,
            cache,
            timeout: DEFAULT_REVIEW_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve a review for `profile`, reporting each phase to `on_phase`.
    ///
    /// Returns `None` when `cancel` fires first. After cancellation no phase
    /// is reported and the cache is left untouched.
    pub async fn fetch<F>(
        &self,
        profile: &ProfileData,
        cancel: &CancellationToken,
        mut on_phase: F,
    ) -> Option<ReviewOutcome>
    where
        F: FnMut(ReviewPhase) + Send,
    {
        if cancel.is_cancelled() {
            return None;
        }

        on_phase(ReviewPhase::CacheCheck);
        let key = profile.cache_key();
        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!("[Review] cache hit {}", key);
            let outcome = ReviewOutcome::from_entry(entry, true);
            on_phase(ReviewPhase::Resolved(outcome.clone()));
            return Some(outcome);
        }

        on_phase(ReviewPhase::Fetching);
        let entry = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("[Review] lookup {} cancelled", key);
                return None;
            }
            entry = self.resolve(profile) => entry,
        };
        if cancel.is_cancelled() {
            return None;
        }

        self.cache.insert(key, entry.clone());
        let outcome = ReviewOutcome::from_entry(entry, false);
        on_phase(ReviewPhase::Resolved(outcome.clone()));
        Some(outcome)
    }

    /// Walk the fallback chain. Always produces an entry.
    async fn resolve(&self, profile: &ProfileData) -> CacheEntry {
        if let Some((review, source)) = self.relevant(profile).await {
            return CacheEntry::found(review, source);
        }
        if let Some(review) = self.random().await {
            return CacheEntry::found(review, ReviewSource::Random);
        }

        if profile.has_program() {
            tracing::info!(
                "[Review] no backend review, synthesizing one for {}",
                profile.program
            );
            let today = chrono::Local::now().date_naive();
            CacheEntry::found(
                synthesize_review(&profile.program, today),
                ReviewSource::Synthesized,
            )
        } else {
            tracing::info!("[Review] no backend review and no program to synthesize from");
            CacheEntry::empty(NO_REVIEW_AVAILABLE)
        }
    }

    async fn relevant(&self, profile: &ProfileData) -> Option<(ReviewRecord, ReviewSource)> {
        match timeout(self.timeout, self.api.relevant_review(profile, self.timeout)).await {
            Ok(Ok(envelope)) if envelope.success => match envelope.review {
                Some(review) => {
                    let source = if envelope.is_fallback {
                        ReviewSource::Random
                    } else {
                        ReviewSource::Relevant
                    };
                    Some((review, source))
                }
                None => {
                    tracing::warn!("[Review] relevant review response had no review");
                    None
                }
            },
            Ok(Ok(envelope)) => {
                tracing::warn!(
                    "[Review] relevant review unsuccessful: {}",
                    envelope.error.as_deref().unwrap_or("no error given")
                );
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("[Review] relevant review failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("[Review] relevant review timed out after {:?}", self.timeout);
                None
            }
        }
    }

    async fn random(&self) -> Option<ReviewRecord> {
        match timeout(self.timeout, self.api.random_review(self.timeout)).await {
            Ok(Ok(Some(review))) => Some(review),
            Ok(Ok(None)) => {
                tracing::warn!("[Review] random review response had no review");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("[Review] random review failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("[Review] random review timed out after {:?}", self.timeout);
                None
            }
        }
    }
}
