//! Contact Service
//!
//! Validates and submits the contact/intake form.

use std::path::Path;
use std::sync::Arc;

use aspirepath_client::CareerApi;
use aspirepath_core::{ContactReceipt, ContactSubmission, UploadFile};

use crate::utils::error::{AppError, AppResult};

/// Service for the contact/intake form
pub struct ContactService {
    api: Arc<CareerApi>,
}

impl ContactService {
    pub fn new(api: Arc<CareerApi>) -> Self {
        Self { api }
    }

    /// Validate locally, then post the form. Invalid input never reaches the
    /// network.
    pub async fn submit(&self, submission: &ContactSubmission) -> AppResult<ContactReceipt> {
        submission.validate()?;
        let receipt = self.api.submit_contact(submission).await?;
        tracing::info!(
            "[Contact] submission {} accepted",
            receipt.submission_id
        );
        Ok(receipt)
    }
}

/// Read a file from disk into an upload part named after the file.
pub fn load_upload(path: &Path) -> AppResult<UploadFile> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| AppError::validation(format!("Not a file: {}", path.display())))?;
    let bytes = std::fs::read(path)?;
    Ok(UploadFile::new(file_name, bytes))
}
