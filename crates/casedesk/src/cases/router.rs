use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::api::{ApiError, CaseApi};
use super::domain::{CaseId, CaseKind};
use super::evaluation::ScoreFormula;
use super::filter::FilterCriteria;
use super::lineset::{resolve_line_items, ResolvedLineItems};
use super::page::{CaseRow, PageSnapshot};
use super::reconciler::ActionState;
use super::view::{CaseListView, SortField};
use crate::error::AppError;

/// Shared state of the view routes.
pub struct CaseViews<A> {
    api: Arc<A>,
    page_size: usize,
}

impl<A> CaseViews<A> {
    pub fn new(api: Arc<A>, page_size: usize) -> Self {
        Self { api, page_size }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    page: Option<usize>,
}

/// Read-only derived views over the case API: one filtered, sorted page per request.
pub fn case_view_router<A>(api: Arc<A>, page_size: usize) -> Router
where
    A: CaseApi + 'static,
{
    Router::new()
        .route("/api/v1/views/:kind", get(case_page_handler::<A>))
        .route(
            "/api/v1/views/:kind/:case_id/line-items",
            get(line_items_handler::<A>),
        )
        .with_state(Arc::new(CaseViews::new(api, page_size)))
}

fn parse_kind(raw: &str) -> Result<CaseKind, AppError> {
    raw.parse::<CaseKind>().map_err(AppError::UnknownCaseKind)
}

pub(crate) async fn case_page_handler<A>(
    State(views): State<Arc<CaseViews<A>>>,
    Path(kind): Path<String>,
    Query(criteria): Query<FilterCriteria>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<PageSnapshot>, AppError>
where
    A: CaseApi + 'static,
{
    let kind = parse_kind(&kind)?;
    let records = views.api.list(kind).await?;
    let formula = ScoreFormula::default_for(kind);

    let mut view = CaseListView::new(SortField::default_for(kind), views.page_size);
    view.set_criteria(criteria);
    view.set_page(paging.page.unwrap_or(1));
    let slice = view.page_of(&records);

    Ok(Json(PageSnapshot {
        kind,
        criteria: view.criteria().clone(),
        rows: slice
            .items
            .iter()
            .map(|record| CaseRow::derive(record, kind, formula, ActionState::Idle))
            .collect(),
        page: slice.page,
        page_size: slice.page_size,
        page_count: slice.page_count,
        total: slice.total,
        loading: false,
        saving: false,
    }))
}

pub(crate) async fn line_items_handler<A>(
    State(views): State<Arc<CaseViews<A>>>,
    Path((kind, case_id)): Path<(String, String)>,
) -> Result<Json<ResolvedLineItems>, AppError>
where
    A: CaseApi + 'static,
{
    let kind = parse_kind(&kind)?;
    let id = CaseId::new(case_id);
    let records = views.api.list(kind).await?;
    let record = records
        .iter()
        .find(|record| record.id == id)
        .ok_or_else(|| ApiError::not_found(format!("{kind} case {id}")))?;

    Ok(Json(resolve_line_items(record)))
}
