//! API Error Types
//!
//! Error taxonomy for everything that crosses the network boundary. Errors are
//! `Clone` so a single failure can be handed to every caller that joined a
//! de-duplicated request.

use serde::{Deserialize, Serialize};

/// Machine classification of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// No response reached the client (DNS, refused connection, reset).
    Network,
    /// Client or server deadline exceeded.
    Timeout,
    /// 4xx response.
    Client,
    /// 5xx response.
    Server,
    /// 2xx response whose body did not have the expected shape.
    MalformedResponse,
    /// 2xx response carrying an explicit `success: false` envelope.
    ApplicationFailure,
}

impl ApiErrorKind {
    /// Whether repeating the same request may succeed.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ApiErrorKind::Network | ApiErrorKind::Timeout | ApiErrorKind::Server
        )
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Client => write!(f, "client"),
            ApiErrorKind::Server => write!(f, "server"),
            ApiErrorKind::MalformedResponse => write!(f, "malformed-response"),
            ApiErrorKind::ApplicationFailure => write!(f, "application-failure"),
        }
    }
}

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub message: String,
    /// Raw response body, when one was received.
    pub body: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            body: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::MalformedResponse, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ApplicationFailure, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// `detail` field from a JSON error body, the way the backend reports
    /// validation and lookup failures.
    pub fn detail(&self) -> Option<String> {
        let body = self.body.as_deref()?;
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        match &value["detail"] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} error ({}): {}", self.kind, status, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Classify a non-2xx HTTP response.
pub fn parse_http_error(status: u16, body: &str) -> ApiError {
    let kind = match status {
        500..=599 => ApiErrorKind::Server,
        408 => ApiErrorKind::Timeout,
        _ => ApiErrorKind::Client,
    };

    let message = extract_message(body).unwrap_or_else(|| match status {
        404 => "Not found".to_string(),
        _ => format!("HTTP {}", status),
    });

    let err = ApiError::new(kind, message).with_status(status);
    if body.is_empty() {
        err
    } else {
        err.with_body(body)
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|field| value[field].as_str().map(str::to_string))
}

/// Classify a transport-level reqwest failure.
pub fn from_reqwest(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::timeout(err.to_string());
    }
    if let Some(status) = err.status() {
        return parse_http_error(status.as_u16(), "");
    }
    if err.is_decode() {
        return ApiError::malformed(err.to_string());
    }
    ApiError::network(err.to_string())
}
