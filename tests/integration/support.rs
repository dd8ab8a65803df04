//! Shared test doubles and fixtures.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use aspirepath::models::settings::AppConfig;
use aspirepath::{AppState, SessionStore};
use aspirepath_client::{ApiRequest, ApiResult, RequestBody, Transport};

pub const RELEVANT: &str = "/api/v1/reviews/get-relevant-review";
pub const RANDOM: &str = "/api/v1/reviews/get-random-review";

pub fn analyze_path(response_id: &str) -> String {
    format!("/api/v1/typeform/analyze/{}", response_id)
}

struct Step {
    delay: Duration,
    response: ApiResult<Value>,
}

/// In-memory backend answering from per-path scripts.
///
/// Queued steps are consumed in order; once a path's queue is empty its
/// `always` response (if any) is used. Unscripted paths fail as `network`.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Step>>>,
    always: Mutex<HashMap<String, (Duration, ApiResult<Value>)>>,
    calls: Mutex<Vec<ApiRequest>>,
    completed: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, path: impl Into<String>, response: ApiResult<Value>) -> &Self {
        self.push_delayed(path, Duration::ZERO, response)
    }

    pub fn push_delayed(
        &self,
        path: impl Into<String>,
        delay: Duration,
        response: ApiResult<Value>,
    ) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(path.into())
            .or_default()
            .push_back(Step { delay, response });
        self
    }

    pub fn always(&self, path: impl Into<String>, delay: Duration, response: ApiResult<Value>) {
        self.always
            .lock()
            .unwrap()
            .insert(path.into(), (delay, response));
    }

    /// Number of requests sent to `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests that ran to the end of their scripted delay.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// JSON bodies sent to `path`, in order.
    pub fn json_bodies(&self, path: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .filter_map(|r| match &r.body {
                RequestBody::Json(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    fn next_step(&self, path: &str) -> Step {
        if let Some(step) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
        {
            return step;
        }
        match self.always.lock().unwrap().get(path) {
            Some((delay, response)) => Step {
                delay: *delay,
                response: response.clone(),
            },
            None => Step {
                delay: Duration::ZERO,
                response: Err(aspirepath_client::ApiError::network(format!(
                    "no script for {}",
                    path
                ))),
            },
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let step = self.next_step(&request.path);
        self.calls.lock().unwrap().push(request);
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        step.response
    }
}

/// App state over `transport` with a fresh store.
pub fn app(transport: Arc<ScriptedTransport>) -> AppState {
    AppState::with_transport(AppConfig::default(), transport, SessionStore::new())
}

/// Questionnaire envelope around [`report_json`].
pub fn analysis_envelope(response_id: &str, score: f64, top_path: &str) -> Value {
    json!({
        "success": true,
        "response_id": response_id,
        "analysis": report_json(score, top_path)
    })
}

pub fn report_json(score: f64, top_path: &str) -> Value {
    json!({
        "automationRiskScore": score,
        "automationRiskInsight": "Routine reporting work is increasingly automated.",
        "strengths": [
            { "strength": "Excel", "description": "Advanced spreadsheet modelling." },
            { "strength": "Communication", "description": "Explains findings clearly." },
            { "strength": "Attention to Detail", "description": "Catches data issues early." }
        ],
        "skillsToImprove": [
            { "skill": "SQL", "description": "Query relational data directly." },
            { "skill": "Python", "description": "Automate analysis pipelines." },
            { "skill": "Statistics", "description": "Test hypotheses rigorously." }
        ],
        "recommendedCareerPaths": [{
            "title": top_path,
            "description": "Turn raw data into business decisions.",
            "growthRate": "23%",
            "demandLevel": "High",
            "skillsRequired": ["SQL", "Python", "Tableau"]
        }],
        "recommendedSchools": [{
            "name": "DataWorks Academy",
            "logoUrl": "https://example.org/logo.png",
            "description": "Part-time analytics bootcamp.",
            "reviewSource": "Course Report",
            "reviewScore": 4.7,
            "reviewCount": 312,
            "programs": [{ "name": "Data Analytics", "duration": "16 weeks", "cost": "$9,500" }]
        }],
        "faqs": [
            { "question": "Do I need a degree?", "answer": "No." }
        ]
    })
}

pub fn review_envelope(name: &str, is_fallback: bool) -> Value {
    json!({
        "success": true,
        "is_fallback": is_fallback,
        "review": {
            "reviewer_name": name,
            "review_date": "2026-03-02",
            "student_type": "Career Changer",
            "course": "Data Analytics",
            "format": "Online",
            "verified": "Yes",
            "review_title": "Worth it",
            "review_content": "Landed an analyst role within three months.",
            "overall_rating": "5",
            "instructor_rating": 5,
            "curriculum_rating": 4,
            "job_assistance_rating": "4"
        }
    })
}
