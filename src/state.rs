//! Application State
//!
//! Wires configuration, the session store and the services together. Built
//! once at startup; tests inject their own transport and store.

use std::sync::Arc;

use aspirepath_client::{CareerApi, HttpClient, Transport};

use crate::models::settings::AppConfig;
use crate::services::{
    AnalysisFlow, ContactService, KnowledgeBaseService, ReviewFlow, SessionStore,
};
use crate::utils::error::{AppError, AppResult};

/// Application state holding every service
pub struct AppState {
    config: AppConfig,
    store: SessionStore,
    api: Arc<CareerApi>,
    reviews: ReviewFlow,
    analysis: AnalysisFlow,
    contact: ContactService,
    knowledge: KnowledgeBaseService,
}

impl AppState {
    /// Build the state against the configured backend
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;
        let client = HttpClient::new(&config.client_config())?;
        tracing::debug!("[State] backend at {}", client.base_url());
        Ok(Self::with_transport(config, Arc::new(client), SessionStore::new()))
    }

    /// Build the state over any transport and store
    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        store: SessionStore,
    ) -> Self {
        let api = Arc::new(
            CareerApi::new(transport, store.dedup()).with_analysis_timeout(config.analysis_timeout()),
        );
        let reviews = ReviewFlow::new(Arc::clone(&api), store.reviews().clone())
            .with_timeout(config.review_timeout());
        let analysis = AnalysisFlow::new(
            Arc::clone(&api),
            reviews.clone(),
            store.analysis_slot().clone(),
            config.retry_policy(),
        );

        Self {
            contact: ContactService::new(Arc::clone(&api)),
            knowledge: KnowledgeBaseService::new(Arc::clone(&api)),
            config,
            store,
            api,
            reviews,
            analysis,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn analysis(&self) -> &AnalysisFlow {
        &self.analysis
    }

    /// Another analysis view over this session.
    ///
    /// It has its own state and cancellation but shares the session's
    /// admission slot, so only one analysis runs per `AppState`.
    pub fn new_analysis_flow(&self) -> AnalysisFlow {
        AnalysisFlow::new(
            Arc::clone(&self.api),
            self.reviews.clone(),
            self.store.analysis_slot().clone(),
            self.config.retry_policy(),
        )
    }

    pub fn reviews(&self) -> &ReviewFlow {
        &self.reviews
    }

    pub fn contact(&self) -> &ContactService {
        &self.contact
    }

    pub fn knowledge(&self) -> &KnowledgeBaseService {
        &self.knowledge
    }

    /// Cancel all in-flight work
    pub fn shutdown(&self) {
        self.analysis.shutdown();
    }
}
