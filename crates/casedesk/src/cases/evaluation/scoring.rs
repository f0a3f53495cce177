use serde::{Deserialize, Serialize};

use super::super::domain::{CaseKind, CaseRecord};

/// True iff all four handler scores are present; a partial evaluation counts as missing.
pub fn is_handler_evaluated(record: &CaseRecord) -> bool {
    record.handler_evaluation.scores().is_complete()
}

/// Requester total: the four scores plus the work-mode score, missing values as 0.
pub fn user_total(record: &CaseRecord) -> u32 {
    let evaluation = &record.user_evaluation;
    evaluation.scores().total() + u32::from(evaluation.form.unwrap_or(0))
}

/// Handler total: the four scores, missing values as 0.
pub fn handler_total(record: &CaseRecord) -> u32 {
    record.handler_evaluation.scores().total()
}

/// How a screen blends the requester and handler totals into one number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formula", rename_all = "snake_case")]
pub enum ScoreFormula {
    /// Plain `user_total + handler_total`.
    Sum,
    /// `user * user_total + handler * handler_total`, rounded to one decimal.
    Weighted { user: f64, handler: f64 },
}

impl ScoreFormula {
    pub const STANDARD_WEIGHTS: ScoreFormula = ScoreFormula::Weighted {
        user: 0.4,
        handler: 0.6,
    };

    /// Delivery and receiving tables show the weighted blend; the other lists show the sum.
    pub const fn default_for(kind: CaseKind) -> Self {
        match kind {
            CaseKind::Delivery | CaseKind::Receiving => Self::STANDARD_WEIGHTS,
            CaseKind::Warranty | CaseKind::Incident | CaseKind::Internal => Self::Sum,
        }
    }

    pub fn combine(self, user_total: u32, handler_total: u32) -> f64 {
        match self {
            ScoreFormula::Sum => f64::from(user_total + handler_total),
            ScoreFormula::Weighted { user, handler } => {
                let blended = user * f64::from(user_total) + handler * f64::from(handler_total);
                (blended * 10.0).round() / 10.0
            }
        }
    }
}

pub fn combined_score(record: &CaseRecord, formula: ScoreFormula) -> f64 {
    formula.combine(user_total(record), handler_total(record))
}
