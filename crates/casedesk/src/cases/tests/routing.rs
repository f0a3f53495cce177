use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::cases::api::InMemoryCaseApi;
use crate::cases::domain::{CaseKind, CaseRecord, CaseStatus, LineItem};
use crate::cases::router::case_view_router;

async fn get_json(api: InMemoryCaseApi, uri: &str) -> (StatusCode, Value) {
    let response: Response = case_view_router(Arc::new(api), 10)
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

fn incidents(count: u32) -> Vec<CaseRecord> {
    (1..=count)
        .map(|n| {
            let status = if n % 2 == 0 {
                CaseStatus::InProgress
            } else {
                CaseStatus::Received
            };
            with_status(
                case_record(&format!("inc-{n:02}"), &format!("Incident {n}"), at(n, 8)),
                status,
            )
        })
        .collect()
}

#[tokio::test]
async fn view_route_serves_a_filtered_sorted_page() {
    let api = backend(CaseKind::Incident, incidents(14));

    let (status, body) = get_json(api, "/api/v1/views/incidents?status=IN_PROGRESS&page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "incident");
    assert_eq!(body["total"], 7);
    assert_eq!(body["page_count"], 1);
    assert_eq!(body["rows"][0]["record"]["id"], "inc-14");
    assert_eq!(body["rows"][0]["status_label"], "In progress");
    assert_eq!(body["rows"][0]["actions_enabled"], true);
    assert_eq!(body["rows"][0]["action_state"], json!({ "state": "idle" }));
}

#[tokio::test]
async fn view_route_clamps_pages_and_accepts_kind_labels() {
    let api = backend(CaseKind::Incident, incidents(14));

    let (status, body) = get_json(api, "/api/v1/views/incident?page=7&search=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["rows"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn unknown_kinds_are_not_found() {
    let (status, body) = get_json(InMemoryCaseApi::new(), "/api/v1/views/invoices").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown case kind 'invoices'");
}

#[tokio::test]
async fn line_item_route_resolves_structured_and_legacy_rows() {
    let mut structured = case_record("rcv-1", "Inbound pallets", at(2, 8));
    structured.line_items = vec![LineItem {
        id: "li-1".to_string(),
        name: "Pallet".to_string(),
        code: None,
        quantity: 4,
        serial_number: None,
    }];
    let mut legacy = case_record("rcv-2", "Older receipt", at(3, 8));
    legacy.description = r#"[{"name":"Crate","quantity":"2"}]"#.to_string();
    let api = backend(CaseKind::Receiving, vec![structured, legacy]);

    let (status, body) = get_json(api.clone(), "/api/v1/views/receivings/rcv-1/line-items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "structured");
    assert_eq!(body["content"][0]["quantity"], 4);

    let (_, body) = get_json(api.clone(), "/api/v1/views/receivings/rcv-2/line-items").await;
    assert_eq!(body["source"], "legacy_description");
    assert_eq!(body["content"][0]["name"], "Crate");

    let (status, body) = get_json(api, "/api/v1/views/receivings/rcv-9/line-items").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "case api error: receiving case rcv-9 not found");
}

#[tokio::test]
async fn upstream_failures_are_relayed() {
    let api = backend(CaseKind::Warranty, Vec::new());
    api.fail_next(crate::cases::api::ApiError::Transport("connection refused".to_string()));

    let (status, body) = get_json(api, "/api/v1/views/warranties").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "case api error: request failed: connection refused");
}
