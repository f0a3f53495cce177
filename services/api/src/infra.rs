use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use casedesk::cases::api::InMemoryCaseApi;
use casedesk::cases::domain::{
    CaseId, CaseKind, CaseRecord, CaseStatus, EmployeeRef, HandlerEvaluation, LineItem,
    OrganizationRef, TypeRef, UserBasicInfo, UserEvaluation,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_kind(raw: &str) -> Result<CaseKind, String> {
    raw.parse::<CaseKind>().map_err(|value| {
        let known: Vec<&str> = CaseKind::ALL.iter().map(|kind| kind.label()).collect();
        format!("unknown case kind '{value}' (expected one of {})", known.join(", "))
    })
}

pub(crate) fn parse_status(raw: &str) -> Result<CaseStatus, String> {
    raw.parse::<CaseStatus>()
        .map_err(|value| format!("unknown status '{value}'"))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn employee(id: &str, first_name: &str, last_name: &str) -> EmployeeRef {
    EmployeeRef {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: Some(format!(
            "{}.{}@example.com",
            first_name.to_ascii_lowercase(),
            last_name.to_ascii_lowercase()
        )),
    }
}

fn partner(id: &str, short_name: &str, full_name: &str) -> OrganizationRef {
    OrganizationRef {
        id: id.to_string(),
        short_name: Some(short_name.to_string()),
        full_name: Some(full_name.to_string()),
    }
}

fn catalog_type(id: &str, name: &str) -> TypeRef {
    TypeRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub(crate) fn demo_employees() -> Vec<EmployeeRef> {
    vec![
        employee("emp-ana", "Ana", "Lopez"),
        employee("emp-ben", "Ben", "Ortiz"),
        employee("emp-chloe", "Chloe", "Nguyen"),
    ]
}

pub(crate) fn demo_partners() -> Vec<OrganizationRef> {
    vec![
        partner("org-northwind", "Northwind", "Northwind Traders Ltd"),
        partner("org-contoso", "Contoso", "Contoso Logistics GmbH"),
    ]
}

struct SeedCase<'a> {
    kind: CaseKind,
    title: &'a str,
    description: &'a str,
    days_ago: i64,
    status: CaseStatus,
    customer: Option<usize>,
    case_type: Option<&'a str>,
}

/// Case records for every kind, spread over the last few weeks relative to `now`.
fn demo_cases(now: DateTime<Utc>) -> Vec<(CaseKind, CaseRecord)> {
    let seeds = [
        SeedCase {
            kind: CaseKind::Incident,
            title: "Label printer jams on every batch",
            description: "Dock 2 thermal printer stops after ten labels",
            days_ago: 2,
            status: CaseStatus::Received,
            customer: None,
            case_type: Some("incident-hardware"),
        },
        SeedCase {
            kind: CaseKind::Incident,
            title: "Scanner offline",
            description: "Handheld scanner does not pair with the base station",
            days_ago: 6,
            status: CaseStatus::InProgress,
            customer: None,
            case_type: Some("incident-hardware"),
        },
        SeedCase {
            kind: CaseKind::Incident,
            title: "Inventory sync stalled",
            description: "Nightly export to the ERP has not run since Monday",
            days_ago: 12,
            status: CaseStatus::Completed,
            customer: None,
            case_type: Some("incident-software"),
        },
        SeedCase {
            kind: CaseKind::Warranty,
            title: "Forklift battery swelling",
            description: "Battery pack from the spring order shows swelling",
            days_ago: 4,
            status: CaseStatus::Received,
            customer: Some(0),
            case_type: Some("warranty-repair"),
        },
        SeedCase {
            kind: CaseKind::Internal,
            title: "Quarterly stock count",
            description: "Plan the count for aisles A to F",
            days_ago: 9,
            status: CaseStatus::InProgress,
            customer: None,
            case_type: Some("internal-audit"),
        },
        SeedCase {
            kind: CaseKind::Receiving,
            title: "Inbound pallets from Contoso",
            description: r#"[{"name":"Shelf bracket","code":"SB-20","quantity":"40"},{"name":"Bolt kit","quantity":5}]"#,
            days_ago: 1,
            status: CaseStatus::Received,
            customer: Some(1),
            case_type: None,
        },
        SeedCase {
            kind: CaseKind::Delivery,
            title: "Replacement scanners to Northwind",
            description: "",
            days_ago: 3,
            status: CaseStatus::InProgress,
            customer: Some(0),
            case_type: None,
        },
    ];

    let employees = demo_employees();
    let partners = demo_partners();
    let types = demo_case_types();

    seeds
        .iter()
        .enumerate()
        .map(|(index, seed)| {
            let created_at = now - Duration::days(seed.days_ago);
            let mut record = CaseRecord {
                id: CaseId::new(format!("{}-seed-{}", seed.kind.label(), index + 1)),
                title: seed.title.to_string(),
                description: seed.description.to_string(),
                crm_reference_code: None,
                notes: None,
                requester: employees[index % employees.len()].clone(),
                handler: employees[(index + 1) % employees.len()].clone(),
                customer: seed.customer.map(|position| partners[position].clone()),
                case_type: seed.case_type.and_then(|id| {
                    types
                        .iter()
                        .flat_map(|(_, entries)| entries.iter())
                        .find(|entry| entry.id == id)
                        .cloned()
                }),
                status: CaseStatus::Received,
                start_date: created_at,
                end_date: None,
                in_progress_at: None,
                created_at,
                updated_at: created_at,
                user_evaluation: UserEvaluation {
                    difficulty: Some(2),
                    estimated_time: Some(3),
                    impact: Some(3),
                    urgency: Some(4),
                    form: Some(2),
                    assessed_at: Some(created_at),
                },
                handler_evaluation: HandlerEvaluation::default(),
                line_items: Vec::new(),
            };

            if seed.status != CaseStatus::Received {
                record.transition_to(CaseStatus::InProgress, created_at + Duration::hours(2));
            }
            if seed.status == CaseStatus::Completed {
                record.handler_evaluation = HandlerEvaluation {
                    difficulty: Some(3),
                    estimated_time: Some(2),
                    impact: Some(4),
                    urgency: Some(4),
                    assessed_at: Some(created_at + Duration::hours(3)),
                    notes: Some("Restarted the export job".to_string()),
                };
                record.transition_to(CaseStatus::Completed, created_at + Duration::days(1));
            }
            if seed.kind == CaseKind::Delivery {
                record.line_items = vec![LineItem {
                    id: format!("{}-line-1", record.id),
                    name: "Handheld scanner".to_string(),
                    code: Some("HS-400".to_string()),
                    quantity: 3,
                    serial_number: None,
                }];
            }

            (seed.kind, record)
        })
        .collect()
}

fn demo_case_types() -> Vec<(CaseKind, Vec<TypeRef>)> {
    vec![
        (
            CaseKind::Incident,
            vec![
                catalog_type("incident-hardware", "Hardware"),
                catalog_type("incident-software", "Software"),
            ],
        ),
        (
            CaseKind::Warranty,
            vec![catalog_type("warranty-repair", "Repair")],
        ),
        (
            CaseKind::Internal,
            vec![catalog_type("internal-audit", "Audit")],
        ),
    ]
}

/// In-memory case backend with a small directory and a handful of cases per kind.
pub(crate) fn seed_demo_backend(now: DateTime<Utc>) -> InMemoryCaseApi {
    let mut backend = InMemoryCaseApi::new()
        .with_employees(demo_employees())
        .with_partners(demo_partners())
        .with_current_user(UserBasicInfo {
            id: "user-1".to_string(),
            name: "Ana Lopez".to_string(),
            role: Some("ADMIN".to_string()),
            employee_id: Some("emp-ana".to_string()),
        });

    for (kind, types) in demo_case_types() {
        backend = backend.with_case_types(kind, types);
    }
    for (kind, record) in demo_cases(now) {
        backend = backend.with_cases(kind, [record]);
    }
    backend
}

#[cfg(test)]
mod tests {
    use super::*;
    use casedesk::cases::api::CaseApi;

    #[tokio::test]
    async fn seeded_backend_covers_every_case_kind() {
        let backend = seed_demo_backend(Utc::now());

        for kind in CaseKind::ALL {
            let cases = backend.list(kind).await.expect("seeded list");
            assert!(!cases.is_empty(), "{kind} has no seeded cases");
        }

        let incidents = backend.list(CaseKind::Incident).await.expect("incidents");
        let completed = incidents
            .iter()
            .find(|record| record.status == CaseStatus::Completed)
            .expect("completed incident");
        assert!(completed.end_date > completed.in_progress_at);
        assert_eq!(completed.type_name(), Some("Software"));
    }

    #[test]
    fn kind_arguments_accept_labels_and_resources() {
        assert_eq!(parse_kind("receivings"), Ok(CaseKind::Receiving));
        let err = parse_kind("tickets").expect_err("unknown kind");
        assert!(err.contains("warranty, incident, internal, delivery, receiving"));
        assert_eq!(parse_status("processing"), Ok(CaseStatus::InProgress));
    }
}
