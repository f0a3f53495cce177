use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::EvaluationScores;

/// Server-assigned case identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub String);

impl CaseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The case collections exposed by the case API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    Warranty,
    Incident,
    Internal,
    Delivery,
    Receiving,
}

impl CaseKind {
    pub const ALL: [CaseKind; 5] = [
        CaseKind::Warranty,
        CaseKind::Incident,
        CaseKind::Internal,
        CaseKind::Delivery,
        CaseKind::Receiving,
    ];

    /// Path segment under `/api/` for this collection.
    pub const fn resource(self) -> &'static str {
        match self {
            CaseKind::Warranty => "warranties",
            CaseKind::Incident => "incidents",
            CaseKind::Internal => "internal-cases",
            CaseKind::Delivery => "deliveries",
            CaseKind::Receiving => "receivings",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CaseKind::Warranty => "warranty",
            CaseKind::Incident => "incident",
            CaseKind::Internal => "internal",
            CaseKind::Delivery => "delivery",
            CaseKind::Receiving => "receiving",
        }
    }

    /// Type catalog endpoint segment, for kinds classified by a catalog.
    pub const fn type_catalog(self) -> Option<&'static str> {
        match self {
            CaseKind::Warranty => Some("warranty-types"),
            CaseKind::Incident => Some("incident-types"),
            CaseKind::Internal => Some("case-types"),
            CaseKind::Delivery | CaseKind::Receiving => None,
        }
    }

    pub const fn has_line_items(self) -> bool {
        matches!(self, CaseKind::Delivery | CaseKind::Receiving)
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CaseKind {
    type Err = String;

    /// Accepts either the kind label (`incident`) or the resource segment (`incidents`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        CaseKind::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized || kind.resource() == normalized)
            .ok_or_else(|| raw.to_string())
    }
}

/// Case status lattice shared by every case kind; only the display label differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Received,
    #[serde(alias = "PROCESSING")]
    InProgress,
    Completed,
    Cancelled,
}

impl CaseStatus {
    pub const fn code(self) -> &'static str {
        match self {
            CaseStatus::Received => "RECEIVED",
            CaseStatus::InProgress => "IN_PROGRESS",
            CaseStatus::Completed => "COMPLETED",
            CaseStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn label_for(self, kind: CaseKind) -> &'static str {
        match (self, kind) {
            (CaseStatus::Received, _) => "Received",
            (CaseStatus::InProgress, CaseKind::Delivery | CaseKind::Receiving) => "Processing",
            (CaseStatus::InProgress, _) => "In progress",
            (CaseStatus::Completed, _) => "Completed",
            (CaseStatus::Cancelled, _) => "Cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Cancelled)
    }
}

impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "RECEIVED" => Ok(CaseStatus::Received),
            "IN_PROGRESS" | "PROCESSING" => Ok(CaseStatus::InProgress),
            "COMPLETED" => Ok(CaseStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(CaseStatus::Cancelled),
            _ => Err(raw.to_string()),
        }
    }
}

/// Employee reference embedded in case records (requester and handler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl EmployeeRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Customer, supplier, or partner organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl OrganizationRef {
    pub fn display_name(&self) -> &str {
        self.short_name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Entry of a case type catalog (incident types, warranty types, case types).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TypeRefPayload")]
pub struct TypeRef {
    pub id: String,
    pub name: String,
}

/// Wire shapes observed for a type reference: a bare name or a full catalog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeRefPayload {
    Name(String),
    Entry {
        #[serde(default)]
        id: Option<String>,
        name: String,
    },
}

impl From<TypeRefPayload> for TypeRef {
    fn from(payload: TypeRefPayload) -> Self {
        match payload {
            TypeRefPayload::Name(name) => TypeRef {
                id: name.clone(),
                name,
            },
            TypeRefPayload::Entry { id, name } => TypeRef {
                id: id.unwrap_or_else(|| name.clone()),
                name,
            },
        }
    }
}

/// Requester evaluation recorded when the case is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserEvaluation {
    #[serde(rename = "userDifficulty", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(rename = "userEstimatedTime", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u8>,
    #[serde(rename = "userImpact", skip_serializing_if = "Option::is_none")]
    pub impact: Option<u8>,
    #[serde(rename = "userUrgency", skip_serializing_if = "Option::is_none")]
    pub urgency: Option<u8>,
    /// Work-mode score (onsite/offsite).
    #[serde(rename = "userForm", skip_serializing_if = "Option::is_none")]
    pub form: Option<u8>,
    #[serde(rename = "userAssessmentDate", skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
}

impl UserEvaluation {
    pub fn scores(&self) -> EvaluationScores {
        EvaluationScores {
            difficulty: self.difficulty,
            estimated_time: self.estimated_time,
            impact: self.impact,
            urgency: self.urgency,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores().is_empty() && self.form.is_none()
    }
}

/// Handler evaluation recorded after the case is picked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerEvaluation {
    #[serde(rename = "adminDifficulty", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(rename = "adminEstimatedTime", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u8>,
    #[serde(rename = "adminImpact", skip_serializing_if = "Option::is_none")]
    pub impact: Option<u8>,
    #[serde(rename = "adminUrgency", skip_serializing_if = "Option::is_none")]
    pub urgency: Option<u8>,
    #[serde(rename = "adminAssessmentDate", skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
    #[serde(rename = "adminAssessmentNotes", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HandlerEvaluation {
    pub fn scores(&self) -> EvaluationScores {
        EvaluationScores {
            difficulty: self.difficulty,
            estimated_time: self.estimated_time,
            impact: self.impact,
            urgency: self.urgency,
        }
    }
}

/// Product row attached to receiving and delivery cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// A case as returned by the case API, normalized at the deserialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: CaseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm_reference_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub requester: EmployeeRef,
    pub handler: EmployeeRef,
    #[serde(
        default,
        alias = "supplier",
        alias = "partner",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer: Option<OrganizationRef>,
    #[serde(
        default,
        alias = "incidentType",
        alias = "warrantyType",
        skip_serializing_if = "Option::is_none"
    )]
    pub case_type: Option<TypeRef>,
    pub status: CaseStatus,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub user_evaluation: UserEvaluation,
    #[serde(flatten)]
    pub handler_evaluation: HandlerEvaluation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItem>,
}

impl CaseRecord {
    pub fn type_name(&self) -> Option<&str> {
        self.case_type.as_ref().map(|case_type| case_type.name.as_str())
    }

    /// Move the case to `status`, stamping `in_progress_at`/`end_date` when they are unset.
    pub fn transition_to(&mut self, status: CaseStatus, now: DateTime<Utc>) {
        let stamps = status_stamps(status, self.in_progress_at, self.end_date, now);
        self.status = status;
        self.in_progress_at = stamps.0;
        self.end_date = stamps.1;
    }
}

/// Timestamps implied by moving to `status`: `(in_progress_at, end_date)`.
pub(crate) fn status_stamps(
    status: CaseStatus,
    in_progress_at: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match status {
        CaseStatus::InProgress => (in_progress_at.or(Some(now)), end_date),
        CaseStatus::Completed => (in_progress_at, end_date.or(Some(now))),
        CaseStatus::Received | CaseStatus::Cancelled => (in_progress_at, end_date),
    }
}

/// Directory entry returned by `GET /api/partners/list`.
pub type Partner = OrganizationRef;

/// Directory entry returned by `GET /api/employees/list`.
pub type Employee = EmployeeRef;

/// Signed-in user summary returned by `GET /api/user/basic-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBasicInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}
