mod options;
mod scoring;

pub use options::{CatalogEntry, EvaluationCatalog, EvaluationOption, EvaluationRole};
pub use scoring::{combined_score, handler_total, is_handler_evaluated, user_total, ScoreFormula};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{HandlerEvaluation, UserEvaluation};
use super::validation::ValidationError;

/// Lowest and highest score a scored question accepts.
pub const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Questions asked in an evaluation. `Form` (work mode) is only asked of the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationCategory {
    Difficulty,
    EstimatedTime,
    Impact,
    Urgency,
    Form,
}

impl EvaluationCategory {
    pub const SCORED: [EvaluationCategory; 4] = [
        EvaluationCategory::Difficulty,
        EvaluationCategory::EstimatedTime,
        EvaluationCategory::Impact,
        EvaluationCategory::Urgency,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            EvaluationCategory::Difficulty => "difficulty",
            EvaluationCategory::EstimatedTime => "estimated_time",
            EvaluationCategory::Impact => "impact",
            EvaluationCategory::Urgency => "urgency",
            EvaluationCategory::Form => "form",
        }
    }
}

/// The four scored questions of one party's evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationScores {
    pub difficulty: Option<u8>,
    pub estimated_time: Option<u8>,
    pub impact: Option<u8>,
    pub urgency: Option<u8>,
}

impl EvaluationScores {
    pub fn get(&self, category: EvaluationCategory) -> Option<u8> {
        match category {
            EvaluationCategory::Difficulty => self.difficulty,
            EvaluationCategory::EstimatedTime => self.estimated_time,
            EvaluationCategory::Impact => self.impact,
            EvaluationCategory::Urgency => self.urgency,
            EvaluationCategory::Form => None,
        }
    }

    pub fn values(&self) -> [Option<u8>; 4] {
        [self.difficulty, self.estimated_time, self.impact, self.urgency]
    }

    pub fn is_complete(&self) -> bool {
        self.values().iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }

    pub fn missing(&self) -> Vec<EvaluationCategory> {
        EvaluationCategory::SCORED
            .into_iter()
            .filter(|category| self.get(*category).is_none())
            .collect()
    }

    pub fn total(&self) -> u32 {
        self.values()
            .iter()
            .map(|value| u32::from(value.unwrap_or(0)))
            .sum()
    }
}

/// Option ids picked in an evaluation form, one per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSelection {
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
}

impl EvaluationSelection {
    pub fn select(&mut self, category: EvaluationCategory, option_id: impl Into<String>) {
        let value = Some(option_id.into()).filter(|id: &String| !id.trim().is_empty());
        match category {
            EvaluationCategory::Difficulty => self.difficulty = value,
            EvaluationCategory::EstimatedTime => self.estimated_time = value,
            EvaluationCategory::Impact => self.impact = value,
            EvaluationCategory::Urgency => self.urgency = value,
            EvaluationCategory::Form => self.form = value,
        }
    }

    pub fn selected(&self, category: EvaluationCategory) -> Option<&str> {
        let value = match category {
            EvaluationCategory::Difficulty => &self.difficulty,
            EvaluationCategory::EstimatedTime => &self.estimated_time,
            EvaluationCategory::Impact => &self.impact,
            EvaluationCategory::Urgency => &self.urgency,
            EvaluationCategory::Form => &self.form,
        };
        value.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        EvaluationCategory::SCORED
            .into_iter()
            .chain([EvaluationCategory::Form])
            .all(|category| self.selected(category).is_none())
    }

    /// Resolve the handler form into a submission; all four questions are required together.
    pub fn resolve_handler(
        &self,
        catalog: &EvaluationCatalog,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HandlerEvaluationSubmission, ValidationError> {
        let scores = self.resolve_scores(EvaluationRole::Admin, catalog)?;
        let missing = scores.missing();
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteEvaluation {
                role: EvaluationRole::Admin,
                missing,
            });
        }

        Ok(HandlerEvaluationSubmission {
            difficulty: scores.difficulty.unwrap_or_default(),
            estimated_time: scores.estimated_time.unwrap_or_default(),
            impact: scores.impact.unwrap_or_default(),
            urgency: scores.urgency.unwrap_or_default(),
            assessed_at: now,
            notes: notes.filter(|text| !text.trim().is_empty()),
        })
    }

    /// Resolve the requester form. An untouched form yields `None`; otherwise the four scored
    /// questions and the work mode are required together.
    pub fn resolve_user(
        &self,
        catalog: &EvaluationCatalog,
        now: DateTime<Utc>,
    ) -> Result<Option<UserEvaluation>, ValidationError> {
        if self.is_empty() {
            return Ok(None);
        }

        let scores = self.resolve_scores(EvaluationRole::User, catalog)?;
        let form = self.resolve_points(EvaluationRole::User, EvaluationCategory::Form, catalog)?;

        let mut missing = scores.missing();
        if form.is_none() {
            missing.push(EvaluationCategory::Form);
        }
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteEvaluation {
                role: EvaluationRole::User,
                missing,
            });
        }

        Ok(Some(UserEvaluation {
            difficulty: scores.difficulty,
            estimated_time: scores.estimated_time,
            impact: scores.impact,
            urgency: scores.urgency,
            form,
            assessed_at: Some(now),
        }))
    }

    fn resolve_scores(
        &self,
        role: EvaluationRole,
        catalog: &EvaluationCatalog,
    ) -> Result<EvaluationScores, ValidationError> {
        let mut scores = EvaluationScores::default();
        for category in EvaluationCategory::SCORED {
            let points = self.resolve_points(role, category, catalog)?;
            if let Some(points) = points {
                if !SCORE_RANGE.contains(&points) {
                    return Err(ValidationError::ScoreOutOfRange { category, points });
                }
            }
            match category {
                EvaluationCategory::Difficulty => scores.difficulty = points,
                EvaluationCategory::EstimatedTime => scores.estimated_time = points,
                EvaluationCategory::Impact => scores.impact = points,
                EvaluationCategory::Urgency => scores.urgency = points,
                EvaluationCategory::Form => {}
            }
        }
        Ok(scores)
    }

    fn resolve_points(
        &self,
        role: EvaluationRole,
        category: EvaluationCategory,
        catalog: &EvaluationCatalog,
    ) -> Result<Option<u8>, ValidationError> {
        let Some(option_id) = self.selected(category) else {
            return Ok(None);
        };
        catalog
            .option(role, category, option_id)
            .map(|option| Some(option.points))
            .ok_or_else(|| ValidationError::UnknownOption {
                role,
                category,
                option_id: option_id.to_string(),
            })
    }
}

/// Body of `PUT /api/{resource}/{id}/evaluation`. Every score is required by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerEvaluationSubmission {
    #[serde(rename = "adminDifficulty")]
    pub difficulty: u8,
    #[serde(rename = "adminEstimatedTime")]
    pub estimated_time: u8,
    #[serde(rename = "adminImpact")]
    pub impact: u8,
    #[serde(rename = "adminUrgency")]
    pub urgency: u8,
    #[serde(rename = "adminAssessmentDate")]
    pub assessed_at: DateTime<Utc>,
    #[serde(
        rename = "adminAssessmentNotes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl HandlerEvaluationSubmission {
    pub fn into_evaluation(self) -> HandlerEvaluation {
        HandlerEvaluation {
            difficulty: Some(self.difficulty),
            estimated_time: Some(self.estimated_time),
            impact: Some(self.impact),
            urgency: Some(self.urgency),
            assessed_at: Some(self.assessed_at),
            notes: self.notes,
        }
    }
}
