//! Analysis state machine
//!
//! `Idle → Submitting → Succeeded | Failed`, advanced only by [`reduce`].

use serde::Serialize;
use thiserror::Error;

use aspirepath_client::{ApiError, ApiErrorKind};
use aspirepath_core::{AnalysisRequest, AnalysisResult};

use crate::services::review::ReviewPhase;

pub const MSG_TIMEOUT: &str = "The request timed out. Please try again in a few moments.";
pub const MSG_NOT_FOUND: &str = "Response ID not found. Please check the ID and try again.";
pub const MSG_SERVER: &str = "Server error occurred. Our team has been notified.";
pub const MSG_ANALYSIS_FAILED: &str = "Failed to analyze your response";
pub const MSG_MALFORMED: &str =
    "Invalid response data structure. This may be a temporary issue. Please try again later.";
pub const MSG_NETWORK: &str =
    "Could not reach the analysis service. Please check your connection and try again.";

/// Terminal analysis failure, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowFailure {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    /// User-facing text.
    pub message: String,
    /// Diagnostic text from the underlying error.
    pub detail: String,
}

impl FlowFailure {
    pub fn from_api(err: &ApiError) -> Self {
        let message = match err.kind {
            ApiErrorKind::Timeout => MSG_TIMEOUT.to_string(),
            ApiErrorKind::Server => MSG_SERVER.to_string(),
            ApiErrorKind::Client if err.status == Some(404) => MSG_NOT_FOUND.to_string(),
            ApiErrorKind::Client => err.detail().unwrap_or_else(|| err.message.clone()),
            ApiErrorKind::ApplicationFailure if err.message.trim().is_empty() => {
                MSG_ANALYSIS_FAILED.to_string()
            }
            ApiErrorKind::ApplicationFailure => err.message.clone(),
            ApiErrorKind::MalformedResponse => MSG_MALFORMED.to_string(),
            ApiErrorKind::Network => MSG_NETWORK.to_string(),
        };

        Self {
            kind: err.kind,
            status: err.status,
            message,
            detail: err.to_string(),
        }
    }
}

impl std::fmt::Display for FlowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why a flow operation did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("An analysis is already in progress. Please wait for it to finish.")]
    Busy,

    #[error("The last analysis failed. Reset or retry before submitting a new one.")]
    NeedsReset,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("The analysis was cancelled.")]
    Cancelled,

    #[error("{0}")]
    Failed(FlowFailure),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisState {
    #[default]
    Idle,
    Submitting {
        #[serde(skip)]
        request: AnalysisRequest,
        attempt: u32,
    },
    Succeeded {
        #[serde(skip)]
        request: AnalysisRequest,
        result: AnalysisResult,
        review: ReviewPhase,
    },
    Failed {
        #[serde(skip)]
        request: AnalysisRequest,
        error: FlowFailure,
    },
}

impl AnalysisState {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Submitting { .. } => "submitting",
            AnalysisState::Succeeded { .. } => "succeeded",
            AnalysisState::Failed { .. } => "failed",
        }
    }

    pub fn request(&self) -> Option<&AnalysisRequest> {
        match self {
            AnalysisState::Idle => None,
            AnalysisState::Submitting { request, .. }
            | AnalysisState::Succeeded { request, .. }
            | AnalysisState::Failed { request, .. } => Some(request),
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn review(&self) -> Option<&ReviewPhase> {
        match self {
            AnalysisState::Succeeded { review, .. } => Some(review),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FlowFailure> {
        match self {
            AnalysisState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The rejection a new submission would get in this state, if any.
    pub fn submit_guard(&self) -> Option<FlowError> {
        match self {
            AnalysisState::Submitting { .. } => Some(FlowError::Busy),
            AnalysisState::Failed { .. } => Some(FlowError::NeedsReset),
            AnalysisState::Idle | AnalysisState::Succeeded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Submit(AnalysisRequest),
    /// A retry attempt (numbered from 1) is starting.
    Attempt(u32),
    Resolved(AnalysisResult),
    Rejected(FlowFailure),
    Review(ReviewPhase),
    Reset,
}

/// Next state for `event`, or `None` when the event does not apply.
pub fn reduce(state: &AnalysisState, event: AnalysisEvent) -> Option<AnalysisState> {
    use AnalysisEvent as E;
    use AnalysisState as S;

    match (state, event) {
        (_, E::Reset) => Some(S::Idle),

        (S::Idle | S::Succeeded { .. }, E::Submit(request)) => Some(S::Submitting {
            request,
            attempt: 1,
        }),

        (S::Submitting { request, attempt }, E::Attempt(next)) if next > *attempt => {
            Some(S::Submitting {
                request: request.clone(),
                attempt: next,
            })
        }

        (S::Submitting { request, .. }, E::Resolved(result)) => Some(S::Succeeded {
            request: request.clone(),
            result,
            review: ReviewPhase::Idle,
        }),

        (S::Submitting { request, .. }, E::Rejected(error)) => Some(S::Failed {
            request: request.clone(),
            error,
        }),

        (S::Succeeded { request, result, review }, E::Review(phase)) if !review.is_resolved() => {
            Some(S::Succeeded {
                request: request.clone(),
                result: result.clone(),
                review: phase,
            })
        }

        _ => None,
    }
}
