//! Analysis Flow
//!
//! Drives one analysis at a time through the state machine in
//! [`super::state`]. Every submission gets a generation number and its own
//! cancellation token. Writes from a submission are applied only while its
//! generation is current, so a reset or a newer submission silences all
//! older work, including its review continuation.
//!
//! Admission is shared across the session through an [`AnalysisSlot`]: while
//! one flow is submitting, every other flow of the same session is rejected
//! with [`FlowError::Busy`] unless it asks for the same source.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use aspirepath_client::{ApiResult, CareerApi};
use aspirepath_core::{AnalysisRequest, AnalysisResult, AnalysisSource, CoreError, ProfileData};

use super::retry::RetryPolicy;
use super::state::{reduce, AnalysisEvent, AnalysisState, FlowError, FlowFailure};
use crate::services::review::{ReviewFlow, ReviewOutcome};
use crate::services::store::{AnalysisClaim, AnalysisSlot};

/// Observable flow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisSnapshot {
    /// Bumped by every submission and reset.
    pub generation: u64,
    pub state: AnalysisState,
}

struct Control {
    token: CancellationToken,
    review_task: Option<JoinHandle<Option<ReviewOutcome>>>,
    /// Slot hold of the running submission, tagged with its generation.
    claim: Option<(u64, AnalysisClaim)>,
}

struct Inner {
    api: Arc<CareerApi>,
    reviews: ReviewFlow,
    policy: RetryPolicy,
    slot: AnalysisSlot,
    state: watch::Sender<AnalysisSnapshot>,
    shutdown: CancellationToken,
    control: Mutex<Control>,
}

/// Analysis retrieval for one view of the report.
#[derive(Clone)]
pub struct AnalysisFlow {
    inner: Arc<Inner>,
}

impl AnalysisFlow {
    pub fn new(
        api: Arc<CareerApi>,
        reviews: ReviewFlow,
        slot: AnalysisSlot,
        policy: RetryPolicy,
    ) -> Self {
        let (state, _) = watch::channel(AnalysisSnapshot::default());
        let shutdown = CancellationToken::new();
        let control = Control {
            token: shutdown.child_token(),
            review_task: None,
            claim: None,
        };

        Self {
            inner: Arc::new(Inner {
                api,
                reviews,
                policy,
                slot,
                state,
                shutdown,
                control: Mutex::new(control),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Submit a questionnaire response identifier.
    pub async fn submit_response_id(&self, response_id: &str) -> Result<AnalysisResult, FlowError> {
        let request = AnalysisRequest::questionnaire(response_id).map_err(|e| match e {
            CoreError::Validation(msg) => FlowError::InvalidRequest(msg),
            other => FlowError::InvalidRequest(other.to_string()),
        })?;
        self.submit(request).await
    }

    /// Run `request` to completion.
    ///
    /// Rejected with [`FlowError::Busy`] while another submission is running
    /// and with [`FlowError::NeedsReset`] after a failure.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<AnalysisResult, FlowError> {
        let (generation, token) = self.begin(request.clone())?;
        let _release = ReleaseOnExit {
            flow: self,
            generation,
        };
        tracing::info!("[Analysis] submitting {}", request.label());
        self.run(generation, token, request).await
    }

    /// Reset the failed request and submit it again.
    pub async fn retry(&self) -> Result<AnalysisResult, FlowError> {
        let request = self.failed_request().ok_or_else(|| {
            FlowError::InvalidRequest("There is no failed analysis to retry".to_string())
        })?;
        self.reset();
        self.submit(request).await
    }

    /// Cancel in-flight work and return to `Idle`.
    pub fn reset(&self) {
        let mut control = self.lock_control();
        control.token.cancel();
        control.review_task = None;
        control.claim = None;
        control.token = self.inner.shutdown.child_token();

        self.inner.state.send_modify(|snap| {
            snap.generation += 1;
            snap.state = reduce(&snap.state, AnalysisEvent::Reset).unwrap_or_default();
        });
        tracing::debug!("[Analysis] reset");
    }

    /// Cancel everything for good. Later submissions are rejected and no
    /// further state is written by work started before.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut control = self.lock_control();
        control.review_task = None;
        control.claim = None;
        drop(control);
        tracing::debug!("[Analysis] shut down");
    }

    /// Wait for the review continuation of the current result, if one runs.
    pub async fn wait_for_review(&self) -> Option<ReviewOutcome> {
        let task = self.lock_control().review_task.take()?;
        task.await.ok().flatten()
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.inner
            .control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop the slot hold of `generation` if it is still the one stored.
    fn release(&self, generation: u64) {
        let mut control = self.lock_control();
        if control.claim.as_ref().is_some_and(|(g, _)| *g == generation) {
            control.claim = None;
        }
    }

    fn failed_request(&self) -> Option<AnalysisRequest> {
        match &self.inner.state.borrow().state {
            AnalysisState::Failed { request, .. } => Some(request.clone()),
            _ => None,
        }
    }

    /// Move to `Submitting` and hand out the submission's generation and token.
    fn begin(&self, request: AnalysisRequest) -> Result<(u64, CancellationToken), FlowError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(FlowError::Cancelled);
        }

        let mut control = self.lock_control();
        let mut admitted = Err(FlowError::Busy);
        let mut claim = None;
        self.inner.state.send_if_modified(|snap| {
            if let Some(rejection) = snap.state.submit_guard() {
                admitted = Err(rejection);
                return false;
            }
            // Another flow of this session is running a different analysis.
            let Some(held) = self.inner.slot.claim(&request.source) else {
                return false;
            };
            match reduce(&snap.state, AnalysisEvent::Submit(request)) {
                Some(next) => {
                    snap.generation += 1;
                    snap.state = next;
                    admitted = Ok(snap.generation);
                    claim = Some(held);
                    true
                }
                None => false,
            }
        });

        let generation = admitted.inspect_err(|e| {
            tracing::info!("[Analysis] submission rejected: {}", e);
        })?;

        // Supersede the previous result's review continuation.
        control.token.cancel();
        control.review_task = None;
        control.token = self.inner.shutdown.child_token();
        control.claim = claim.map(|held| (generation, held));
        Ok((generation, control.token.clone()))
    }

    /// Apply `event` if `generation` is still current.
    fn apply(&self, generation: u64, event: AnalysisEvent) -> bool {
        self.inner.state.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            match reduce(&snap.state, event) {
                Some(next) => {
                    snap.state = next;
                    true
                }
                None => false,
            }
        })
    }

    async fn fetch(&self, request: &AnalysisRequest) -> ApiResult<AnalysisResult> {
        match &request.source {
            AnalysisSource::Questionnaire { response_id } => {
                self.inner.api.analyze_questionnaire(response_id).await
            }
            AnalysisSource::Upload(upload) => self.inner.api.analyze_profile(upload).await,
        }
    }

    async fn run(
        &self,
        generation: u64,
        token: CancellationToken,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, FlowError> {
        let mut delays = self.inner.policy.delays().into_iter();
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FlowError::Cancelled),
                outcome = self.fetch(&request) => outcome,
            };

            let err = match outcome {
                Ok(result) => {
                    if !self.apply(generation, AnalysisEvent::Resolved(result.clone())) {
                        return Err(FlowError::Cancelled);
                    }
                    tracing::info!(
                        "[Analysis] {} succeeded on attempt {} (score {})",
                        request.label(),
                        attempt,
                        result.display_score()
                    );
                    let profile = ProfileData::from_analysis(&result, &request.profile);
                    self.spawn_review(generation, &token, profile);
                    return Ok(result);
                }
                Err(err) => err,
            };

            if err.is_retriable() {
                if let Some(delay) = delays.next() {
                    tracing::warn!(
                        "[Analysis] attempt {} for {} failed: {}; retrying in {:?}",
                        attempt,
                        request.label(),
                        err,
                        delay
                    );
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(FlowError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                    if !self.apply(generation, AnalysisEvent::Attempt(attempt)) {
                        return Err(FlowError::Cancelled);
                    }
                    continue;
                }
            }

            let failure = FlowFailure::from_api(&err);
            tracing::error!(
                "[Analysis] {} failed after {} attempt(s): {}",
                request.label(),
                attempt,
                err
            );
            if !self.apply(generation, AnalysisEvent::Rejected(failure.clone())) {
                return Err(FlowError::Cancelled);
            }
            return Err(FlowError::Failed(failure));
        }
    }

    /// Resolve the review for a fresh result in the background.
    fn spawn_review(&self, generation: u64, token: &CancellationToken, profile: ProfileData) {
        let flow = self.clone();
        let reviews = self.inner.reviews.clone();
        let cancel = token.child_token();
        let task = tokio::spawn(async move {
            reviews
                .fetch(&profile, &cancel, |phase| {
                    flow.apply(generation, AnalysisEvent::Review(phase));
                })
                .await
        });

        let mut control = self.lock_control();
        if self.inner.state.borrow().generation == generation {
            control.review_task = Some(task);
        }
    }
}

/// Releases a submission's slot hold however its future ends.
struct ReleaseOnExit<'a> {
    flow: &'a AnalysisFlow,
    generation: u64,
}

impl Drop for ReleaseOnExit<'_> {
    fn drop(&mut self) {
        self.flow.release(self.generation);
    }
}
