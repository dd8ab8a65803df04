//! AspirePath - Career Analysis Client Library
//!
//! Orchestrates career-assessment retrieval against the AspirePath backend.
//! It includes:
//! - Analysis and review retrieval flows with retry, caching and cancellation
//! - Contact submission and knowledge-base services
//! - Configuration storage and the plain-text report projection
//! - The command-line shell used by the binary

pub mod cli;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::{
    AnalysisFlow, AnalysisState, FlowError, ReportView, ReviewFlow, ReviewPhase, SessionStore,
};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
