use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::common::*;
use crate::cases::api::{ApiError, CaseApi, DirectoryApi, HttpCaseApi};
use crate::cases::domain::{CaseId, CaseKind, CaseStatus};
use crate::cases::evaluation::{EvaluationCatalog, EvaluationCategory, EvaluationRole};
use crate::config::ApiConfig;

async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test upstream");
    });
    format!("http://{addr}")
}

fn client(base_url: String) -> HttpCaseApi {
    HttpCaseApi::from_config(&ApiConfig {
        base_url: Some(format!("{base_url}/")),
        token: Some("secret".to_string()),
        auth_retries: 2,
        retry_delay: Duration::from_millis(5),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .expect("client builds")
}

fn wire_list() -> Value {
    json!([case_record("inc-1", "Scanner offline", at(3, 9))])
}

/// Upstream whose list endpoint answers 401 for the first `rejections` calls.
fn flaky_list(rejections: usize, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/api/incidents",
        get(move || {
            let hits = Arc::clone(&hits);
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) < rejections {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "error": "session expired" })),
                    )
                        .into_response()
                } else {
                    Json(wire_list()).into_response()
                }
            }
        }),
    )
}

#[tokio::test]
async fn list_retries_unauthorized_responses() {
    let hits = Arc::new(AtomicUsize::new(0));
    let api = client(spawn_upstream(flaky_list(2, Arc::clone(&hits))).await);

    let records = api.list(CaseKind::Incident).await.expect("third attempt succeeds");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, CaseId::new("inc-1"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn list_gives_up_after_the_retry_budget() {
    let hits = Arc::new(AtomicUsize::new(0));
    let api = client(spawn_upstream(flaky_list(10, Arc::clone(&hits))).await);

    let err = api.list(CaseKind::Incident).await.expect_err("still unauthorized");

    assert_eq!(
        err,
        ApiError::Http {
            status: 401,
            message: "session expired".to_string(),
        }
    );
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn mutations_are_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let router = Router::new().route(
        "/api/incidents/:id/close",
        put(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::UNAUTHORIZED
            }
        }),
    );
    let api = client(spawn_upstream(router).await);

    let err = api
        .close(CaseKind::Incident, &CaseId::new("inc-1"))
        .await
        .expect_err("unauthorized");

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn requests_carry_the_bearer_token() {
    let router = Router::new().route(
        "/api/warranties",
        get(|headers: HeaderMap| async move {
            match headers.get("authorization").and_then(|value| value.to_str().ok()) {
                Some("Bearer secret") => Json(json!([])).into_response(),
                _ => StatusCode::FORBIDDEN.into_response(),
            }
        }),
    );
    let api = client(spawn_upstream(router).await);

    let records = api.list(CaseKind::Warranty).await.expect("authorized");
    assert!(records.is_empty());
}

#[tokio::test]
async fn server_errors_without_json_use_the_status_line() {
    let router = Router::new().route(
        "/api/deliveries",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable") }),
    );
    let api = client(spawn_upstream(router).await);
    let payload = draft("Pallet delivery")
        .to_payload(&EvaluationCatalog::standard(), at(3, 9))
        .expect("valid draft");

    let err = api
        .create(CaseKind::Delivery, &payload)
        .await
        .expect_err("server error");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn malformed_bodies_are_parse_errors() {
    let router = Router::new().route("/api/receivings", get(|| async { "not json" }));
    let api = client(spawn_upstream(router).await);

    let err = api.list(CaseKind::Receiving).await.expect_err("bad body");
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn delete_ignores_the_response_body() {
    let router = Router::new().route(
        "/api/internal-cases/:id",
        delete(|Path(id): Path<String>| async move { format!("deleted {id}") }),
    );
    let api = client(spawn_upstream(router).await);

    api.delete(CaseKind::Internal, &CaseId::new("int-7"))
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn evaluation_is_sent_with_handler_field_names() {
    let received = Arc::new(Mutex::new(None::<Value>));
    let sink = Arc::clone(&received);
    let router = Router::new().route(
        "/api/incidents/:id/evaluation",
        put(move |Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().expect("sink lock") = Some(body);
                let mut record = case_record("inc-1", "Scanner offline", at(3, 9));
                record.status = CaseStatus::InProgress;
                record.handler_evaluation = handler_scores(Some(2), Some(2), Some(3), Some(4));
                Json(record)
            }
        }),
    );
    let api = client(spawn_upstream(router).await);
    let submission = handler_selection([2, 2, 3, 4])
        .resolve_handler(
            &EvaluationCatalog::standard(),
            Some("swap the board".to_string()),
            at(4, 10),
        )
        .expect("complete");

    let record = api
        .evaluate(CaseKind::Incident, &CaseId::new("inc-1"), &submission)
        .await
        .expect("saved");

    assert_eq!(record.handler_evaluation.urgency, Some(4));
    let body = received
        .lock()
        .expect("sink lock")
        .clone()
        .expect("body captured");
    assert_eq!(body["adminDifficulty"], 2);
    assert_eq!(body["adminUrgency"], 4);
    assert_eq!(body["adminAssessmentNotes"], "swap the board");
    assert_eq!(body["adminAssessmentDate"], "2025-03-04T10:00:00Z");
}

#[tokio::test]
async fn kinds_without_a_type_catalog_skip_the_request() {
    let api = client(spawn_upstream(Router::new()).await);

    let types = api.case_types(CaseKind::Delivery).await.expect("no request");
    assert!(types.is_empty());

    let err = api
        .case_types(CaseKind::Incident)
        .await
        .expect_err("route missing upstream");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn evaluation_catalog_is_read_from_the_configuration_endpoint() {
    let router = Router::new().route(
        "/api/evaluation-config",
        get(|| async {
            Json(json!([
                {
                    "evaluationType": "ADMIN",
                    "category": "DIFFICULTY",
                    "options": [
                        { "id": "adm-diff-easy", "points": 1, "label": "Easy" },
                        { "id": "adm-diff-hard", "points": 5, "label": "Hard" }
                    ]
                },
                {
                    "evaluationType": "USER",
                    "category": "FORM",
                    "options": [{ "id": "usr-form-remote", "points": 1, "label": "Remote" }]
                }
            ]))
        }),
    );
    let api = client(spawn_upstream(router).await);

    let entries = api.evaluation_catalog().await.expect("catalog");
    assert_eq!(entries.len(), 2);

    let catalog = EvaluationCatalog::configured_or_standard(entries);
    let hard = catalog
        .option(EvaluationRole::Admin, EvaluationCategory::Difficulty, "adm-diff-hard")
        .expect("configured option");
    assert_eq!(hard.points, 5);
    assert!(catalog
        .option(EvaluationRole::Admin, EvaluationCategory::Difficulty, "handler-difficulty-3")
        .is_none());
    assert_eq!(
        catalog
            .options(EvaluationRole::User, EvaluationCategory::Form)
            .len(),
        1
    );
}

#[test]
fn missing_base_url_is_a_configuration_failure() {
    let err = HttpCaseApi::from_config(&ApiConfig::default()).expect_err("no base url");
    assert!(matches!(err, ApiError::Transport(_)));
}
