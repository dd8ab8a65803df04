//! AspirePath Core
//!
//! Domain types shared by the AspirePath workspace: analysis requests, the
//! career report, reviews and the profile summaries used to look them up.
//! This crate has no network code and no dependency on the application crate.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `career` - Career report (`AnalysisResult`) and score rules
//! - `review` - Reviews, profile summaries and review cache keys
//! - `request` - Analysis requests, profile uploads and the contact form

pub mod career;
pub mod error;
pub mod request;
pub mod review;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Career Report ──────────────────────────────────────────────────────
pub use career::{
    clamp_score, AnalysisResult, CareerPathRecommendation, DemandLevel, Faq, LearningProvider,
    Program, ScoreBand, SkillGap, Strength,
};

// ── Reviews ────────────────────────────────────────────────────────────
pub use review::{Education, Experience, ProfileData, ProfileFields, ReviewRecord};

// ── Requests ───────────────────────────────────────────────────────────
pub use request::{
    AnalysisRequest, AnalysisSource, ContactReceipt, ContactSubmission, ProfileUpload,
    UploadFile, MAX_RESUME_BYTES,
};
