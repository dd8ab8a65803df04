//! Report projection
//!
//! Plain-text view of a career report and its review, as printed by the CLI.

use std::fmt;

use aspirepath_core::{AnalysisResult, ReviewRecord, ScoreBand};

use crate::services::review::{ReviewOutcome, ReviewSource};

const DEFAULT_REVIEW_TITLE: &str = "Student Review";
const MAX_STARS: i32 = 5;

/// Display-ready testimonial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCard {
    pub initial: char,
    pub reviewer_name: String,
    pub stars: u8,
    pub title: String,
    pub excerpt: String,
    pub meta: String,
    pub verified: bool,
    pub source: Option<ReviewSource>,
}

impl ReviewCard {
    pub fn new(review: &ReviewRecord, source: Option<ReviewSource>) -> Self {
        let reviewer_name = review.reviewer_name.trim().to_string();
        let initial = reviewer_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?');
        let title = match review.review_title.trim() {
            "" => DEFAULT_REVIEW_TITLE.to_string(),
            t => t.to_string(),
        };
        let excerpt = review
            .review_content
            .split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty())
            .unwrap_or_default()
            .to_string();
        let meta = [
            review.course.as_str(),
            review.student_type.as_str(),
            review.format.as_str(),
            review.review_date.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" · ");

        Self {
            initial,
            reviewer_name,
            stars: review.overall_rating.clamp(0, MAX_STARS) as u8,
            title,
            excerpt,
            meta,
            verified: review.verified,
            source,
        }
    }

    pub fn stars_line(&self) -> String {
        let filled = self.stars as usize;
        format!(
            "{}{}",
            "★".repeat(filled),
            "☆".repeat(MAX_STARS as usize - filled)
        )
    }
}

impl fmt::Display for ReviewCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.initial, self.reviewer_name)?;
        if self.verified {
            write!(f, " (verified)")?;
        }
        writeln!(f)?;
        if !self.meta.is_empty() {
            writeln!(f, "    {}", self.meta)?;
        }
        writeln!(f, "    {}  {}", self.stars_line(), self.title)?;
        if !self.excerpt.is_empty() {
            writeln!(f, "    \"{}\"", self.excerpt)?;
        }
        Ok(())
    }
}

/// Display-ready report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub score: u8,
    pub band: ScoreBand,
    pub result: AnalysisResult,
    pub review: Option<ReviewCard>,
    /// Shown when the review lookup ended without a review.
    pub review_note: Option<String>,
}

impl ReportView {
    pub fn new(result: &AnalysisResult, review: Option<&ReviewOutcome>) -> Self {
        let score = result.display_score();
        let (card, note) = match review {
            Some(outcome) => match &outcome.review {
                Some(record) => (Some(ReviewCard::new(record, outcome.source)), None),
                None => (None, outcome.error.clone()),
            },
            None => (None, None),
        };

        Self {
            score,
            band: ScoreBand::for_score(score),
            result: result.clone(),
            review: card,
            review_note: note,
        }
    }
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::High => "high",
        ScoreBand::Medium => "medium",
        ScoreBand::Low => "low",
    }
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.result;
        writeln!(
            f,
            "Automation risk: {}/10 ({})",
            self.score,
            band_label(self.band)
        )?;
        writeln!(f, "{}", r.automation_risk_insight)?;
        if let Some(desc) = &r.automation_risk_description {
            writeln!(f, "{}", desc)?;
        }

        if !r.strengths.is_empty() {
            writeln!(f, "\nStrengths")?;
            for s in &r.strengths {
                writeln!(f, "  - {}: {}", s.name, s.description)?;
            }
        }

        if !r.skills_to_improve.is_empty() {
            writeln!(f, "\nSkills to improve")?;
            for s in &r.skills_to_improve {
                writeln!(f, "  - {}: {}", s.name, s.description)?;
            }
        }

        if !r.recommended_career_paths.is_empty() {
            writeln!(f, "\nRecommended career paths")?;
            for p in &r.recommended_career_paths {
                writeln!(
                    f,
                    "  - {} (growth {}, demand {})",
                    p.title, p.growth_rate, p.demand_level
                )?;
                writeln!(f, "    {}", p.description)?;
                if !p.skills_required.is_empty() {
                    writeln!(f, "    Skills: {}", p.skills_required.join(", "))?;
                }
            }
        }

        if !r.learning_providers.is_empty() {
            writeln!(f, "\nLearning providers")?;
            for lp in &r.learning_providers {
                writeln!(
                    f,
                    "  - {} ({:.1} on {}, {} reviews)",
                    lp.name, lp.review_score, lp.review_source, lp.review_count
                )?;
                for program in &lp.programs {
                    writeln!(
                        f,
                        "    * {} - {}, {}",
                        program.name, program.duration, program.cost
                    )?;
                }
            }
        }

        match (&self.review, &self.review_note) {
            (Some(card), _) => {
                writeln!(f, "\nWhat students say")?;
                write!(f, "{}", card)?;
            }
            (None, Some(note)) => writeln!(f, "\nWhat students say\n  {}", note)?,
            (None, None) => {}
        }

        if !r.faqs.is_empty() {
            writeln!(f, "\nFAQ")?;
            for faq in &r.faqs {
                writeln!(f, "  Q: {}", faq.question)?;
                writeln!(f, "  A: {}", faq.answer)?;
            }
        }

        Ok(())
    }
}
