//! Request Description
//!
//! Transport-independent description of one backend call. Bodies are kept as
//! plain data (not `reqwest` builders) so a request can be hashed for
//! de-duplication and replayed by test transports.

use std::time::Duration;

use reqwest::Method;
use sha2::{Digest, Sha256};

use aspirepath_core::UploadFile;

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: UploadFile },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file: UploadFile) -> Self {
        FormPart::File {
            name: name.into(),
            file,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the configured base URL, starting with `/`.
    pub path: String,
    pub body: RequestBody,
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Default coalescing key: the target endpoint.
    pub fn dedup_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Endpoint key refined with a digest of the body, for endpoints where
    /// different payloads are different logical requests.
    pub fn payload_key(&self) -> String {
        match self.payload_digest() {
            Some(digest) => format!("{}#{}", self.dedup_key(), digest),
            None => self.dedup_key(),
        }
    }

    fn payload_digest(&self) -> Option<String> {
        let mut hasher = Sha256::new();
        match &self.body {
            RequestBody::Empty => return None,
            RequestBody::Json(value) => hasher.update(value.to_string().as_bytes()),
            RequestBody::Multipart(parts) => {
                for part in parts {
                    hasher.update(part.name().as_bytes());
                    hasher.update([0]);
                    match part {
                        FormPart::Text { value, .. } => hasher.update(value.as_bytes()),
                        FormPart::File { file, .. } => {
                            hasher.update(file.file_name.as_bytes());
                            hasher.update([0]);
                            hasher.update(&file.bytes);
                        }
                    }
                    hasher.update([0xff]);
                }
            }
        }
        let digest = hasher.finalize();
        Some(digest[..12].iter().map(|b| format!("{:02x}", b)).collect())
    }
}
