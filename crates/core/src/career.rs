//! Career Report Types
//!
//! The structured report returned by the analysis backend. Field names follow
//! the backend's camelCase wire format.

use serde::{Deserialize, Serialize};

/// Lowest automation-risk score that may be displayed.
pub const MIN_SCORE: u8 = 1;

/// Highest automation-risk score that may be displayed.
pub const MAX_SCORE: u8 = 10;

/// Market demand for a recommended career path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandLevel {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl std::fmt::Display for DemandLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemandLevel::High => write!(f, "High"),
            DemandLevel::Medium => write!(f, "Medium"),
            DemandLevel::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strength {
    #[serde(rename = "strength")]
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description_details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    #[serde(rename = "skill")]
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathRecommendation {
    pub title: String,
    pub description: String,
    pub growth_rate: String,
    pub demand_level: DemandLevel,
    #[serde(default)]
    pub skills_required: Vec<String>,
}

/// A program offered by a learning provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub duration: String,
    pub cost: String,
}

/// A learning provider matched to the visitor's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProvider {
    pub name: String,
    #[serde(default)]
    pub logo_url: String,
    pub description: String,
    pub review_source: String,
    pub review_score: f64,
    pub review_count: u32,
    #[serde(default)]
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Career-assessment report for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Raw score as sent by the backend. Use [`AnalysisResult::display_score`]
    /// for anything user-facing.
    pub automation_risk_score: f64,
    pub automation_risk_insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_risk_description: Option<String>,
    pub strengths: Vec<Strength>,
    pub skills_to_improve: Vec<SkillGap>,
    pub recommended_career_paths: Vec<CareerPathRecommendation>,
    #[serde(default, rename = "recommendedSchools")]
    pub learning_providers: Vec<LearningProvider>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

impl AnalysisResult {
    /// Parse a report from a backend JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The score clamped into the displayable range.
    pub fn display_score(&self) -> u8 {
        clamp_score(self.automation_risk_score)
    }

    /// Title of the top recommended career path, if any.
    pub fn top_career_path(&self) -> Option<&str> {
        self.recommended_career_paths
            .first()
            .map(|p| p.title.as_str())
    }
}

/// Clamp a raw automation-risk score into `1..=10`.
///
/// Scores are rounded to the nearest integer first. Non-finite values map to
/// the minimum rather than failing.
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return MIN_SCORE;
    }
    raw.round().clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u8
}

/// Display band for a clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            8.. => ScoreBand::High,
            5..=7 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}
