use chrono::Duration;

use super::common::*;
use crate::cases::domain::CaseStatus;
use crate::cases::evaluation::EvaluationCatalog;
use crate::cases::lineset::LineField;
use crate::cases::validation::{validate_timeline, CaseDraft, ValidationError};

#[test]
fn end_must_be_strictly_after_start() {
    let start = at(3, 9);

    assert!(validate_timeline(start, None, Some(start + Duration::milliseconds(1))).is_ok());
    assert_eq!(
        validate_timeline(start, None, Some(start)),
        Err(ValidationError::EndNotAfterStart { start, end: start })
    );
    assert!(matches!(
        validate_timeline(start, None, Some(start - Duration::hours(1))),
        Err(ValidationError::EndNotAfterStart { .. })
    ));
    assert!(validate_timeline(start, None, None).is_ok());
}

#[test]
fn end_must_be_after_the_in_progress_time() {
    let start = at(3, 9);
    let in_progress_at = at(4, 9);

    assert!(matches!(
        validate_timeline(start, Some(in_progress_at), Some(at(4, 8))),
        Err(ValidationError::EndNotAfterInProgress { .. })
    ));
    assert!(validate_timeline(start, Some(in_progress_at), Some(at(4, 10))).is_ok());
}

#[test]
fn drafts_require_title_parties_and_start_date() {
    let catalog = EvaluationCatalog::standard();

    let blank_title = CaseDraft {
        title: "   ".to_string(),
        ..draft("x")
    };
    assert_eq!(
        blank_title.to_payload(&catalog, at(3, 9)),
        Err(ValidationError::MissingField("title"))
    );

    let no_handler = CaseDraft {
        handler_id: String::new(),
        ..draft("Printer jam")
    };
    assert_eq!(
        no_handler.to_payload(&catalog, at(3, 9)),
        Err(ValidationError::MissingField("handler"))
    );

    let no_start = CaseDraft {
        start_date: None,
        ..draft("Printer jam")
    };
    assert_eq!(
        no_start.to_payload(&catalog, at(3, 9)),
        Err(ValidationError::MissingField("start date"))
    );
}

#[test]
fn status_changes_in_the_form_stamp_timestamps() {
    let mut form = draft("Printer jam");

    form.set_status(CaseStatus::InProgress, at(3, 11));
    assert_eq!(form.in_progress_at, Some(at(3, 11)));

    form.set_status(CaseStatus::Completed, at(5, 16));
    assert_eq!(form.end_date, Some(at(5, 16)));
    assert_eq!(form.status, CaseStatus::Completed);

    let payload = form
        .to_payload(&EvaluationCatalog::standard(), at(5, 16))
        .expect("valid draft");
    assert_eq!(payload.end_date, Some(at(5, 16)));
}

#[test]
fn payload_trims_text_and_omits_untouched_requester_evaluation() {
    let mut form = draft("  Printer jam  ");
    form.crm_reference_code = "  ".to_string();
    let line = form.line_items.add();
    form.line_items.update(&line, LineField::Name, "Thermal head");
    form.line_items.update(&line, LineField::Quantity, "abc");

    let payload = form
        .to_payload(&EvaluationCatalog::standard(), at(3, 9))
        .expect("valid draft");
    assert_eq!(payload.title, "Printer jam");
    assert_eq!(payload.crm_reference_code, None);
    assert_eq!(payload.user_evaluation, None);
    assert_eq!(payload.line_items[0].quantity, 1);

    let body = serde_json::to_value(&payload).expect("serializes");
    assert_eq!(body["requesterId"], "emp-1");
    assert_eq!(body["caseTypeId"], "type-hw");
    assert_eq!(body["status"], "RECEIVED");
    assert!(body.get("userDifficulty").is_none());
    assert!(body.get("crmReferenceCode").is_none());
    assert!(body["lineItems"][0].get("id").is_none());
}

#[test]
fn filled_requester_evaluation_is_flattened_into_the_payload() {
    let form = CaseDraft {
        user_evaluation: requester_selection([2, 3, 4, 5], false),
        ..draft("Printer jam")
    };

    let payload = form
        .to_payload(&EvaluationCatalog::standard(), at(3, 9))
        .expect("valid draft");
    let body = serde_json::to_value(&payload).expect("serializes");
    assert_eq!(body["userDifficulty"], 2);
    assert_eq!(body["userUrgency"], 5);
    assert_eq!(body["userForm"], 1);
    assert_eq!(body["userAssessmentDate"], "2025-03-03T09:00:00Z");
}

#[test]
fn edit_drafts_start_from_the_stored_record() {
    let mut record = case_record("c-9", "Dock door", at(7, 8));
    record.customer = Some(customer());
    record.user_evaluation.difficulty = Some(4);

    let form = CaseDraft::from_record(&record);
    assert_eq!(form.title, "Dock door");
    assert_eq!(form.customer_id, "org-1");
    assert_eq!(form.start_date, Some(at(7, 8)));
    assert!(form.user_evaluation.is_empty());
}
