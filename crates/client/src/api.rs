//! Backend API
//!
//! Typed operations over a [`Transport`], each routed through the shared
//! [`RequestDeduplicator`]. Responses are shared as raw JSON and decoded per
//! caller, so envelope and shape errors surface as `application-failure` and
//! `malformed-response`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use aspirepath_core::{
    AnalysisResult, ContactReceipt, ContactSubmission, ProfileData, ProfileUpload, ReviewRecord,
    UploadFile,
};

use crate::dedup::RequestDeduplicator;
use crate::error::{ApiError, ApiResult};
use crate::request::{ApiRequest, FormPart};
use crate::transport::Transport;

pub const CONTACT_SUBMIT_PATH: &str = "/api/v1/contact/submit";
pub const CAREER_ANALYZE_PATH: &str = "/api/v1/career/analyze";
pub const QUESTIONNAIRE_ANALYZE_PATH: &str = "/api/v1/typeform/analyze";
pub const RELEVANT_REVIEW_PATH: &str = "/api/v1/reviews/get-relevant-review";
pub const RANDOM_REVIEW_PATH: &str = "/api/v1/reviews/get-random-review";
pub const READINESS_PATH: &str = "/api/v1/vectorstore/check-vectorstore";
pub const VECTORSTORE_SETUP_PATH: &str = "/api/v1/vectorstore/setup-vectorstore";

/// Default timeout for analysis calls (3 minutes)
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 180;

/// Response of the relevant-review endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub review: Option<ReviewRecord>,
    #[serde(default)]
    pub is_fallback: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadinessResponse {
    exists: bool,
}

/// Typed backend operations.
pub struct CareerApi {
    transport: Arc<dyn Transport>,
    dedup: Arc<RequestDeduplicator<Value>>,
    analysis_timeout: Duration,
}

impl CareerApi {
    pub fn new(transport: Arc<dyn Transport>, dedup: Arc<RequestDeduplicator<Value>>) -> Self {
        Self {
            transport,
            dedup,
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
        }
    }

    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    /// Send through the de-duplication layer under `key`.
    async fn send_deduped(&self, request: ApiRequest, key: String) -> ApiResult<Value> {
        let transport = Arc::clone(&self.transport);
        self.dedup
            .run(key, move || async move { transport.send(request).await })
            .await
    }

    /// Whether the backend's knowledge base is ready.
    pub async fn check_readiness(&self) -> ApiResult<bool> {
        let request = ApiRequest::get(READINESS_PATH);
        let key = request.dedup_key();
        let value = self.send_deduped(request, key).await?;
        decode::<ReadinessResponse>(value, "readiness").map(|r| r.exists)
    }

    pub async fn submit_contact(&self, submission: &ContactSubmission) -> ApiResult<ContactReceipt> {
        let mut parts = vec![
            FormPart::text("email", submission.email.trim()),
            FormPart::text("country", submission.country.trim()),
            FormPart::text(
                "promotional_emails",
                submission.promotional_emails.to_string(),
            ),
        ];
        if let Some(url) = &submission.linkedin_url {
            parts.push(FormPart::text("linkedin_profile", url.trim()));
        }
        if let Some(resume) = &submission.resume {
            parts.push(FormPart::file("resume", resume.clone()));
        }

        let request = ApiRequest::post(CONTACT_SUBMIT_PATH).multipart(parts);
        let key = request.payload_key();
        let value = self.send_deduped(request, key).await?;
        decode(value, "contact receipt")
    }

    /// Analyze a LinkedIn profile and/or resume.
    pub async fn analyze_profile(&self, upload: &ProfileUpload) -> ApiResult<AnalysisResult> {
        let mut parts = Vec::new();
        if let Some(url) = &upload.linkedin_url {
            parts.push(FormPart::text("linkedin_profile", url.trim()));
        }
        if let Some(resume) = &upload.resume {
            parts.push(FormPart::file("resume", resume.clone()));
        }

        let request = ApiRequest::post(CAREER_ANALYZE_PATH)
            .multipart(parts)
            .timeout(self.analysis_timeout);
        let key = request.payload_key();
        let value = self.send_deduped(request, key).await?;
        decode(value, "analysis")
    }

    /// Analyze a questionnaire response by its identifier.
    pub async fn analyze_questionnaire(&self, response_id: &str) -> ApiResult<AnalysisResult> {
        let path = format!(
            "{}/{}",
            QUESTIONNAIRE_ANALYZE_PATH,
            urlencoding::encode(response_id)
        );
        let request = ApiRequest::post(path).timeout(self.analysis_timeout);
        let key = request.dedup_key();
        let value = self.send_deduped(request, key).await?;
        decode_questionnaire(value)
    }

    pub async fn relevant_review(
        &self,
        profile: &ProfileData,
        timeout: Duration,
    ) -> ApiResult<ReviewEnvelope> {
        let request = ApiRequest::post(RELEVANT_REVIEW_PATH)
            .json(json!({ "profileData": profile }))
            .timeout(timeout);
        let key = request.payload_key();
        let value = self.send_deduped(request, key).await?;
        decode(value, "review")
    }

    pub async fn random_review(&self, timeout: Duration) -> ApiResult<Option<ReviewRecord>> {
        let request = ApiRequest::get(RANDOM_REVIEW_PATH).timeout(timeout);
        let key = request.dedup_key();
        let value = self.send_deduped(request, key).await?;
        let envelope: ReviewEnvelope = decode(value, "random review")?;
        if !envelope.success {
            return Err(ApiError::application(
                envelope
                    .error
                    .unwrap_or_else(|| "random review unavailable".to_string()),
            ));
        }
        Ok(envelope.review)
    }

    /// Upload documents to seed the backend knowledge base.
    pub async fn setup_vector_store(&self, documents: Vec<UploadFile>) -> ApiResult<Value> {
        let parts = documents
            .into_iter()
            .map(|doc| FormPart::file("files", doc))
            .collect();
        let request = ApiRequest::post(VECTORSTORE_SETUP_PATH)
            .multipart(parts)
            .timeout(self.analysis_timeout);
        let key = request.payload_key();
        self.send_deduped(request, key).await
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> ApiResult<T> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| {
        let err = ApiError::malformed(format!("unexpected {} payload: {}", what, e)).with_body(body);
        tracing::warn!("[Api] {}", err);
        err
    })
}

/// Unwrap `{ success, response_id, analysis }`.
///
/// An explicit `success: false` wins over any payload that came with it.
fn decode_questionnaire(value: Value) -> ApiResult<AnalysisResult> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Failed to analyze your response")
            .to_string();
        tracing::warn!("[Api] questionnaire analysis rejected: {}", message);
        return Err(ApiError::application(message).with_body(value.to_string()));
    }

    match value.get("analysis") {
        Some(analysis) if analysis.is_object() => decode(analysis.clone(), "analysis"),
        _ => {
            let err = ApiError::malformed("response has no analysis payload")
                .with_body(value.to_string());
            tracing::warn!("[Api] {}", err);
            Err(err)
        }
    }
}
