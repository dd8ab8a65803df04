//! HTTP Client
//!
//! The single configured request-sending object: base URL, default timeout,
//! credential policy and centralized failure logging.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use crate::error::{from_reqwest, parse_http_error, ApiError, ApiResult};
use crate::request::{ApiRequest, FormPart, RequestBody};
use crate::transport::Transport;

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout (2 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Keep and resend cookies set by the backend.
    pub send_credentials: bool,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            send_credentials: true,
            user_agent: format!("AspirePath/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Build a `reqwest::Client` for the given configuration.
pub fn build_http_client(config: &ClientConfig) -> ApiResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .cookie_store(config.send_credentials)
        .build()
        .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: url::Url,
    default_timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = url::Url::parse(&config.base_url).map_err(|e| {
            ApiError::network(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        Ok(Self {
            client: build_http_client(config)?,
            base_url,
            default_timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn to_form(parts: Vec<FormPart>) -> ApiResult<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File { name, file } => {
                let part = reqwest::multipart::Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)
                    .map_err(|e| ApiError::network(format!("invalid mime type: {}", e)))?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

fn log_failure(request: &str, err: &ApiError) {
    match err.status {
        Some(status) if status >= 500 => {
            tracing::error!(
                "[Http] {} failed: {} (status {}, body: {})",
                request,
                err,
                status,
                err.body.as_deref().unwrap_or("")
            );
        }
        _ => {
            tracing::warn!(
                "[Http] {} failed: {} (body: {})",
                request,
                err,
                err.body.as_deref().unwrap_or("")
            );
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> ApiResult<serde_json::Value> {
        let label = request.dedup_key();
        let url = self.endpoint(&request.path);
        tracing::debug!("[Http] {} -> {}", label, url);

        let mut builder = self
            .client
            .request(request.method, &url)
            .timeout(request.timeout.unwrap_or(self.default_timeout));

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(parts) => builder.multipart(to_form(parts)?),
        };

        let result = async {
            let response = builder.send().await.map_err(|e| from_reqwest(&e))?;
            let status = response.status();
            let body = response.text().await.map_err(|e| from_reqwest(&e))?;

            if !status.is_success() {
                return Err(parse_http_error(status.as_u16(), &body));
            }

            serde_json::from_str(&body).map_err(|e| {
                ApiError::malformed(format!("response is not valid JSON: {}", e))
                    .with_status(status.as_u16())
                    .with_body(body)
            })
        }
        .await;

        if let Err(err) = &result {
            log_failure(&label, err);
        }
        result
    }
}
