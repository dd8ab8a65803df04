//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by the CLI.

pub mod analysis;
pub mod contact;
pub mod knowledge;
pub mod report;
pub mod review;
pub mod store;

pub use analysis::{AnalysisFlow, AnalysisSnapshot, AnalysisState, FlowError, RetryPolicy};
pub use contact::ContactService;
pub use knowledge::KnowledgeBaseService;
pub use report::{ReportView, ReviewCard};
pub use review::{ReviewFlow, ReviewOutcome, ReviewPhase};
pub use store::{CacheEntry, ReviewCache, ReviewSource, SessionStore};
