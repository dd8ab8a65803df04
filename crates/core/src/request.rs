//! Request Types
//!
//! What a visitor submits: an analysis request (questionnaire response or
//! profile upload) and the contact/intake form.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::review::ProfileFields;

/// Maximum resume size accepted by the backend (1 MiB).
pub const MAX_RESUME_BYTES: usize = 1024 * 1024;

/// A file attached to a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// LinkedIn profile and/or resume for the profile-analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpload {
    pub linkedin_url: Option<String>,
    pub resume: Option<UploadFile>,
}

impl ProfileUpload {
    pub fn validate(&self) -> CoreResult<()> {
        if self.linkedin_url.is_none() && self.resume.is_none() {
            return Err(CoreError::validation(
                "Provide a LinkedIn profile URL or a resume file",
            ));
        }
        if let Some(url) = &self.linkedin_url {
            validate_profile_url(url)?;
        }
        if let Some(resume) = &self.resume {
            validate_resume(resume)?;
        }
        Ok(())
    }
}

/// Where the analysis input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
    /// Response identifier yielded by the embedded questionnaire.
    Questionnaire { response_id: String },
    /// Direct profile upload.
    Upload(ProfileUpload),
}

/// One submitted analysis request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub source: AnalysisSource,
    pub profile: ProfileFields,
}

impl AnalysisRequest {
    /// Build a questionnaire request. Blank identifiers are rejected.
    pub fn questionnaire(response_id: impl Into<String>) -> CoreResult<Self> {
        let response_id = response_id.into().trim().to_string();
        if response_id.is_empty() {
            return Err(CoreError::validation("Missing or invalid response ID"));
        }
        Ok(Self {
            source: AnalysisSource::Questionnaire { response_id },
            profile: ProfileFields::default(),
        })
    }

    pub fn upload(upload: ProfileUpload) -> CoreResult<Self> {
        upload.validate()?;
        Ok(Self {
            source: AnalysisSource::Upload(upload),
            profile: ProfileFields::default(),
        })
    }

    pub fn with_profile(mut self, profile: ProfileFields) -> Self {
        self.profile = profile;
        self
    }

    pub fn response_id(&self) -> Option<&str> {
        match &self.source {
            AnalysisSource::Questionnaire { response_id } => Some(response_id),
            AnalysisSource::Upload(_) => None,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match &self.source {
            AnalysisSource::Questionnaire { response_id } => format!("response {}", response_id),
            AnalysisSource::Upload(_) => "profile upload".to_string(),
        }
    }
}

/// Contact/intake form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub email: String,
    pub country: String,
    pub promotional_emails: bool,
    pub linkedin_url: Option<String>,
    pub resume: Option<UploadFile>,
}

impl ContactSubmission {
    pub fn validate(&self) -> CoreResult<()> {
        validate_email(&self.email)?;
        if self.country.trim().is_empty() {
            return Err(CoreError::validation("Please select your country"));
        }
        if let Some(url) = &self.linkedin_url {
            validate_profile_url(url)?;
        }
        if let Some(resume) = &self.resume {
            validate_resume(resume)?;
        }
        Ok(())
    }
}

/// Backend acknowledgement of a contact submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub message: String,
    pub submission_id: i64,
}

fn validate_email(email: &str) -> CoreResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::validation("Please enter a valid email address"))
    }
}

fn validate_profile_url(raw: &str) -> CoreResult<()> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|_| CoreError::validation("Please enter a valid LinkedIn URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(CoreError::validation("Please enter a valid LinkedIn URL"));
    }
    Ok(())
}

fn validate_resume(resume: &UploadFile) -> CoreResult<()> {
    if resume.is_empty() {
        return Err(CoreError::validation("Resume file is empty"));
    }
    if resume.len() > MAX_RESUME_BYTES {
        return Err(CoreError::validation(format!(
            "Resume must be at most 1MB (got {:.1} MB)",
            resume.len() as f64 / (1024.0 * 1024.0)
        )));
    }
    Ok(())
}
