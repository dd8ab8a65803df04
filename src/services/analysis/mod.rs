//! Analysis Retrieval
//!
//! Submission, retry with backoff, and the review continuation for one
//! career-assessment report.

pub mod flow;
pub mod retry;
pub mod state;

pub use flow::{AnalysisFlow, AnalysisSnapshot};
pub use retry::{RetryPolicy, MAX_RETRIES_LIMIT};
pub use state::{reduce, AnalysisEvent, AnalysisState, FlowError, FlowFailure};
