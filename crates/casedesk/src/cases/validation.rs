use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{status_stamps, CaseRecord, CaseStatus, UserEvaluation};
use super::evaluation::{EvaluationCatalog, EvaluationCategory, EvaluationRole, EvaluationSelection};
use super::lineset::{LineItemPayload, ProductLineset};

/// Client-side validation failures, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("end date {end} must be after start date {start}")]
    EndNotAfterStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("end date {end} must be after the in-progress time {in_progress_at}")]
    EndNotAfterInProgress {
        in_progress_at: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("{} evaluation is incomplete, missing {missing:?}", .role.label())]
    IncompleteEvaluation {
        role: EvaluationRole,
        missing: Vec<EvaluationCategory>,
    },
    #[error("{} evaluation option '{option_id}' is not offered for {category:?}", .role.label())]
    UnknownOption {
        role: EvaluationRole,
        category: EvaluationCategory,
        option_id: String,
    },
    #[error("score {points} for {category:?} is outside 1-5")]
    ScoreOutOfRange {
        category: EvaluationCategory,
        points: u8,
    },
}

/// Check the timeline invariant: `end_date` strictly after `start_date` and after
/// `in_progress_at` when both are present.
pub fn validate_timeline(
    start: DateTime<Utc>,
    in_progress_at: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    let Some(end) = end else {
        return Ok(());
    };

    if end <= start {
        return Err(ValidationError::EndNotAfterStart { start, end });
    }

    if let Some(in_progress_at) = in_progress_at {
        if end <= in_progress_at {
            return Err(ValidationError::EndNotAfterInProgress {
                in_progress_at,
                end,
            });
        }
    }

    Ok(())
}

/// Editable form state behind the create and edit modals.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDraft {
    pub title: String,
    pub description: String,
    pub crm_reference_code: String,
    pub notes: String,
    pub requester_id: String,
    pub handler_id: String,
    pub customer_id: String,
    pub case_type_id: String,
    pub status: CaseStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub in_progress_at: Option<DateTime<Utc>>,
    pub user_evaluation: EvaluationSelection,
    pub line_items: ProductLineset,
}

impl Default for CaseDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            crm_reference_code: String::new(),
            notes: String::new(),
            requester_id: String::new(),
            handler_id: String::new(),
            customer_id: String::new(),
            case_type_id: String::new(),
            status: CaseStatus::Received,
            start_date: None,
            end_date: None,
            in_progress_at: None,
            user_evaluation: EvaluationSelection::default(),
            line_items: ProductLineset::default(),
        }
    }
}

impl CaseDraft {
    /// Pre-fill the edit modal. The requester evaluation is left untouched so the update is
    /// sent without it and the stored scores survive.
    pub fn from_record(record: &CaseRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            crm_reference_code: record.crm_reference_code.clone().unwrap_or_default(),
            notes: record.notes.clone().unwrap_or_default(),
            requester_id: record.requester.id.clone(),
            handler_id: record.handler.id.clone(),
            customer_id: record
                .customer
                .as_ref()
                .map(|customer| customer.id.clone())
                .unwrap_or_default(),
            case_type_id: record
                .case_type
                .as_ref()
                .map(|case_type| case_type.id.clone())
                .unwrap_or_default(),
            status: record.status,
            start_date: Some(record.start_date),
            end_date: record.end_date,
            in_progress_at: record.in_progress_at,
            user_evaluation: EvaluationSelection::default(),
            line_items: ProductLineset::from_items(&record.line_items),
        }
    }

    /// Change the status from the form, stamping the in-progress or end time when unset.
    pub fn set_status(&mut self, status: CaseStatus, now: DateTime<Utc>) {
        let (in_progress_at, end_date) =
            status_stamps(status, self.in_progress_at, self.end_date, now);
        self.status = status;
        self.in_progress_at = in_progress_at;
        self.end_date = end_date;
    }

    /// Validate the draft and compose the request body.
    pub fn to_payload(
        &self,
        catalog: &EvaluationCatalog,
        now: DateTime<Utc>,
    ) -> Result<CasePayload, ValidationError> {
        let title = required(&self.title, "title")?;
        let requester_id = required(&self.requester_id, "requester")?;
        let handler_id = required(&self.handler_id, "handler")?;
        let start_date = self
            .start_date
            .ok_or(ValidationError::MissingField("start date"))?;

        validate_timeline(start_date, self.in_progress_at, self.end_date)?;

        let user_evaluation = self.user_evaluation.resolve_user(catalog, now)?;

        Ok(CasePayload {
            title,
            description: self.description.trim().to_string(),
            crm_reference_code: optional(&self.crm_reference_code),
            notes: optional(&self.notes),
            requester_id,
            handler_id,
            customer_id: optional(&self.customer_id),
            case_type_id: optional(&self.case_type_id),
            status: self.status,
            start_date,
            end_date: self.end_date,
            in_progress_at: self.in_progress_at,
            user_evaluation,
            line_items: self.line_items.to_payload(),
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Body of `POST /api/{resource}` and `PUT /api/{resource}/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasePayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm_reference_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub requester_id: String,
    pub handler_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type_id: Option<String>,
    pub status: CaseStatus,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress_at: Option<DateTime<Utc>>,
    /// Absent keys deserialize to an empty evaluation; see [`UserEvaluation::is_empty`].
    #[serde(flatten)]
    pub user_evaluation: Option<UserEvaluation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItemPayload>,
}
