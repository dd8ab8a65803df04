//! Review Retrieval
//!
//! Resolves one testimonial for a profile summary:
//! cache, then relevant review, then random review, then a synthesized one.
//!
//! Phases: `Idle → CacheCheck → Fetching → Resolved`. A cache hit goes from
//! `CacheCheck` straight to `Resolved`.

pub mod flow;
pub mod synthesize;

use serde::Serialize;

use aspirepath_core::ReviewRecord;

pub use crate::services::store::ReviewSource;
use crate::services::store::CacheEntry;

pub use flow::{ReviewFlow, NO_REVIEW_AVAILABLE};
pub use synthesize::synthesize_review;

/// Final result of one review lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    pub review: Option<ReviewRecord>,
    pub source: Option<ReviewSource>,
    pub error: Option<String>,
    pub from_cache: bool,
}

impl ReviewOutcome {
    fn from_entry(entry: CacheEntry, from_cache: bool) -> Self {
        Self {
            review: entry.review,
            source: entry.source,
            error: entry.error,
            from_cache,
        }
    }
}

/// Progress of the review lookup inside a successful analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "outcome", rename_all = "snake_case")]
pub enum ReviewPhase {
    #[default]
    Idle,
    CacheCheck,
    Fetching,
    Resolved(ReviewOutcome),
}

impl ReviewPhase {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ReviewPhase::Resolved(_))
    }

    pub fn outcome(&self) -> Option<&ReviewOutcome> {
        match self {
            ReviewPhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }
}
