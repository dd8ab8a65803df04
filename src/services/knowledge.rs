//! Knowledge Base Service
//!
//! Readiness of the backend's document store, and seeding it.

use std::sync::Arc;

use serde_json::Value;

use aspirepath_client::CareerApi;
use aspirepath_core::UploadFile;

use crate::utils::error::{AppError, AppResult};

pub const MSG_READINESS_FAILED: &str =
    "Could not verify vector store status. Please ensure the backend is running.";

pub struct KnowledgeBaseService {
    api: Arc<CareerApi>,
}

impl KnowledgeBaseService {
    pub fn new(api: Arc<CareerApi>) -> Self {
        Self { api }
    }

    /// Whether the backend has its document store in place.
    pub async fn check_readiness(&self) -> AppResult<bool> {
        self.api.check_readiness().await.map_err(|e| {
            tracing::warn!("[Knowledge] readiness check failed: {}", e);
            AppError::internal(MSG_READINESS_FAILED)
        })
    }

    pub async fn setup(&self, documents: Vec<UploadFile>) -> AppResult<Value> {
        if documents.is_empty() {
            return Err(AppError::validation("No documents to upload"));
        }
        let count = documents.len();
        let response = self.api.setup_vector_store(documents).await?;
        tracing::info!("[Knowledge] uploaded {} document(s)", count);
        Ok(response)
    }
}
