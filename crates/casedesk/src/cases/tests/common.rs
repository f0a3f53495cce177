use chrono::{DateTime, TimeZone, Utc};

use crate::cases::api::InMemoryCaseApi;
use crate::cases::domain::{
    CaseId, CaseKind, CaseRecord, CaseStatus, EmployeeRef, HandlerEvaluation, OrganizationRef,
    TypeRef, UserEvaluation,
};
use crate::cases::evaluation::{EvaluationCategory, EvaluationSelection};
use crate::cases::lineset::ProductLineset;
use crate::cases::validation::CaseDraft;

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn employee(id: &str, first_name: &str, last_name: &str) -> EmployeeRef {
    EmployeeRef {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: None,
    }
}

pub(super) fn requester() -> EmployeeRef {
    employee("emp-1", "Ana", "Lopez")
}

pub(super) fn handler() -> EmployeeRef {
    employee("emp-2", "Ben", "Ortiz")
}

pub(super) fn customer() -> OrganizationRef {
    OrganizationRef {
        id: "org-1".to_string(),
        short_name: Some("Northwind".to_string()),
        full_name: Some("Northwind Traders Ltd".to_string()),
    }
}

pub(super) fn hardware_type() -> TypeRef {
    TypeRef {
        id: "type-hw".to_string(),
        name: "Hardware".to_string(),
    }
}

/// Received case created and started at `created_at`, with no evaluations.
pub(super) fn case_record(id: &str, title: &str, created_at: DateTime<Utc>) -> CaseRecord {
    CaseRecord {
        id: CaseId::new(id),
        title: title.to_string(),
        description: String::new(),
        crm_reference_code: None,
        notes: None,
        requester: requester(),
        handler: handler(),
        customer: None,
        case_type: None,
        status: CaseStatus::Received,
        start_date: created_at,
        end_date: None,
        in_progress_at: None,
        created_at,
        updated_at: created_at,
        user_evaluation: UserEvaluation::default(),
        handler_evaluation: HandlerEvaluation::default(),
        line_items: Vec::new(),
    }
}

pub(super) fn with_status(mut record: CaseRecord, status: CaseStatus) -> CaseRecord {
    record.status = status;
    record
}

pub(super) fn handler_scores(
    difficulty: Option<u8>,
    estimated_time: Option<u8>,
    impact: Option<u8>,
    urgency: Option<u8>,
) -> HandlerEvaluation {
    HandlerEvaluation {
        difficulty,
        estimated_time,
        impact,
        urgency,
        assessed_at: None,
        notes: None,
    }
}

/// Option ids from the standard catalog for the four scored handler questions.
pub(super) fn handler_selection(points: [u8; 4]) -> EvaluationSelection {
    let mut selection = EvaluationSelection::default();
    for (category, points) in EvaluationCategory::SCORED.into_iter().zip(points) {
        selection.select(category, format!("handler-{}-{}", category.key(), points));
    }
    selection
}

pub(super) fn requester_selection(points: [u8; 4], onsite: bool) -> EvaluationSelection {
    let mut selection = EvaluationSelection::default();
    for (category, points) in EvaluationCategory::SCORED.into_iter().zip(points) {
        selection.select(category, format!("requester-{}-{}", category.key(), points));
    }
    let form = if onsite {
        "requester-form-onsite"
    } else {
        "requester-form-offsite"
    };
    selection.select(EvaluationCategory::Form, form);
    selection
}

pub(super) fn draft(title: &str) -> CaseDraft {
    CaseDraft {
        title: title.to_string(),
        description: "Label printer jams on every batch".to_string(),
        requester_id: requester().id,
        handler_id: handler().id,
        customer_id: customer().id,
        case_type_id: hardware_type().id,
        start_date: Some(at(3, 9)),
        line_items: ProductLineset::default(),
        ..CaseDraft::default()
    }
}

pub(super) fn backend(kind: CaseKind, records: Vec<CaseRecord>) -> InMemoryCaseApi {
    InMemoryCaseApi::new()
        .with_employees([requester(), handler()])
        .with_partners([customer()])
        .with_case_types(kind, [hardware_type()])
        .with_cases(kind, records)
}
