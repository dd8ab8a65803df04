//! Reviews and Profile Summaries
//!
//! Testimonial records as served by the reviews backend, and the reduced
//! profile data used to look one up.
//!
//! The backend is loose about types: ratings come back as integers or numeric
//! strings and `verified` as a boolean or a "Yes"-style string. Both are
//! normalized on deserialization.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::career::AnalysisResult;

/// Number of strengths and of skill gaps taken from a report.
pub const TOP_SKILLS: usize = 3;

/// A student testimonial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer_name: String,
    #[serde(default)]
    pub review_date: String,
    #[serde(default)]
    pub student_type: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub format: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub verified: bool,
    #[serde(default)]
    pub review_title: String,
    #[serde(default)]
    pub review_content: String,
    #[serde(default, deserialize_with = "de_rating")]
    pub overall_rating: i32,
    #[serde(default, deserialize_with = "de_rating")]
    pub instructor_rating: i32,
    #[serde(default, deserialize_with = "de_rating")]
    pub curriculum_rating: i32,
    #[serde(default, deserialize_with = "de_rating")]
    pub job_assistance_rating: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

fn de_rating<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(match raw {
        None => 0,
        Some(LooseNumber::Int(n)) => n.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        Some(LooseNumber::Float(f)) if f.is_finite() => f.round() as i32,
        Some(LooseNumber::Float(_)) => 0,
        Some(LooseNumber::Text(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i32>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.round() as i32))
                .unwrap_or(0)
        }
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseFlag {
    Bool(bool),
    Text(String),
}

fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseFlag>::deserialize(deserializer)?;
    Ok(match raw {
        None => false,
        Some(LooseFlag::Bool(b)) => b,
        Some(LooseFlag::Text(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "true" | "verified" | "1"
        ),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub field: String,
}

/// Optional profile fields a visitor may supply alongside an analysis request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub program: Option<String>,
}

/// Profile summary sent to the reviews backend (`profileData`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub interests: Vec<String>,
    pub course_interest: String,
    pub program: String,
}

impl ProfileData {
    /// Derive the summary from a report.
    ///
    /// Skills are the top strengths followed by the top skill gaps, in report
    /// order. The program is the first recommended career path, falling back
    /// to the program the visitor declared.
    pub fn from_analysis(result: &AnalysisResult, fields: &ProfileFields) -> Self {
        let skills = result
            .strengths
            .iter()
            .take(TOP_SKILLS)
            .map(|s| s.name.clone())
            .chain(
                result
                    .skills_to_improve
                    .iter()
                    .take(TOP_SKILLS)
                    .map(|s| s.name.clone()),
            )
            .collect();

        let program = result
            .top_career_path()
            .map(str::to_string)
            .or_else(|| fields.program.clone())
            .unwrap_or_default();

        Self {
            skills,
            experience: fields.experience.clone(),
            education: fields.education.clone(),
            interests: fields.interests.clone(),
            course_interest: program.clone(),
            program,
        }
    }

    /// Build a summary directly from a program and skill list.
    pub fn for_program(program: impl Into<String>, skills: Vec<String>) -> Self {
        let program = program.into();
        Self {
            skills,
            course_interest: program.clone(),
            program,
            ..Default::default()
        }
    }

    pub fn has_program(&self) -> bool {
        !self.program.trim().is_empty()
    }

    /// Stable cache key for review lookups.
    ///
    /// Equal profiles map to the same key regardless of list order, letter
    /// case, surrounding whitespace, or duplicates.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |name: &str, values: Vec<String>| {
            hasher.update(name.as_bytes());
            hasher.update([0x1f]);
            for v in values {
                hasher.update(v.as_bytes());
                hasher.update([0x1e]);
            }
            hasher.update([0x1d]);
        };

        field("program", vec![normalize(&self.program)]);
        field("course_interest", vec![normalize(&self.course_interest)]);
        field("skills", canonical(self.skills.iter().map(String::as_str)));
        field(
            "interests",
            canonical(self.interests.iter().map(String::as_str)),
        );
        field(
            "experience",
            canonical_owned(self.experience.iter().map(|e| {
                format!(
                    "{}@{}:{}",
                    e.title,
                    e.company,
                    e.description.as_deref().unwrap_or("")
                )
            })),
        );
        field(
            "education",
            canonical_owned(
                self.education
                    .iter()
                    .map(|e| format!("{}@{}:{}", e.degree, e.institution, e.field)),
            ),
        );

        let digest = hasher.finalize();
        let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
        format!("review:{}", hex)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn canonical<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = values
        .map(normalize)
        .filter(|v| !v.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

fn canonical_owned(values: impl Iterator<Item = String>) -> Vec<String> {
    let owned: Vec<String> = values.collect();
    canonical(owned.iter().map(String::as_str))
}
