//! View model of one mounted case list page.
//!
//! [`CasePage`] is a cloneable handle over shared page state. Requests run without the lock
//! held; their results are applied through the [`CaseActionReconciler`] once they land, and
//! dropped when the page was unmounted in the meantime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::api::{ApiError, CaseApi, DirectoryApi};
use super::domain::{CaseId, CaseKind, CaseRecord, CaseStatus};
use super::evaluation::{
    combined_score, handler_total, is_handler_evaluated, user_total, EvaluationCatalog,
    EvaluationSelection, ScoreFormula,
};
use super::filter::FilterCriteria;
use super::reconciler::{ActionState, CaseAction, CaseActionReconciler};
use super::store::CaseCollectionStore;
use super::validation::CaseDraft;
use super::view::{CaseListView, SortField, DEFAULT_PAGE_SIZE};

/// Per-screen presentation choices.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    pub sort: SortField,
    pub page_size: usize,
    pub formula: ScoreFormula,
    pub catalog: EvaluationCatalog,
}

impl PageOptions {
    pub fn for_kind(kind: CaseKind) -> Self {
        Self {
            sort: SortField::default_for(kind),
            page_size: DEFAULT_PAGE_SIZE,
            formula: ScoreFormula::default_for(kind),
            catalog: EvaluationCatalog::standard(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Outcome of a page operation, ready to be shown as a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notification {
    Success(String),
    Error(String),
    /// The page was unmounted before the result arrived; nothing was applied.
    Discarded,
}

impl Notification {
    pub fn is_success(&self) -> bool {
        matches!(self, Notification::Success(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Notification::Success(message) | Notification::Error(message) => Some(message),
            Notification::Discarded => None,
        }
    }
}

/// One table row with everything the renderer derives from the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRow {
    pub record: CaseRecord,
    pub status_label: &'static str,
    pub user_total: u32,
    pub handler_total: u32,
    pub combined_score: f64,
    pub handler_evaluated: bool,
    pub actions_enabled: bool,
    /// Set in progress and close are offered only while the case is still open.
    pub status_actions_enabled: bool,
    pub action_state: ActionState,
}

impl CaseRow {
    pub fn derive(
        record: &CaseRecord,
        kind: CaseKind,
        formula: ScoreFormula,
        action_state: ActionState,
    ) -> Self {
        Self {
            status_label: record.status.label_for(kind),
            user_total: user_total(record),
            handler_total: handler_total(record),
            combined_score: combined_score(record, formula),
            handler_evaluated: is_handler_evaluated(record),
            actions_enabled: !action_state.is_pending(),
            status_actions_enabled: !action_state.is_pending() && !record.status.is_terminal(),
            action_state,
            record: record.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSnapshot {
    pub kind: CaseKind,
    pub criteria: FilterCriteria,
    pub rows: Vec<CaseRow>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
    pub loading: bool,
    pub saving: bool,
}

#[derive(Debug)]
struct PageState {
    store: CaseCollectionStore,
    view: CaseListView,
    reconciler: CaseActionReconciler,
    formula: ScoreFormula,
    catalog: EvaluationCatalog,
    mounted: bool,
    loading: bool,
    saving: bool,
}

pub struct CasePage<A> {
    api: Arc<A>,
    kind: CaseKind,
    state: Arc<Mutex<PageState>>,
}

impl<A> Clone for CasePage<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            kind: self.kind,
            state: Arc::clone(&self.state),
        }
    }
}

impl<A> CasePage<A>
where
    A: CaseApi,
{
    pub fn mount(api: Arc<A>, kind: CaseKind, options: PageOptions) -> Self {
        debug!(kind = kind.label(), "mounting case page");
        let state = PageState {
            store: CaseCollectionStore::default(),
            view: CaseListView::new(options.sort, options.page_size),
            reconciler: CaseActionReconciler::default(),
            formula: options.formula,
            catalog: options.catalog,
            mounted: true,
            loading: false,
            saving: false,
        };
        Self {
            api,
            kind,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn kind(&self) -> CaseKind {
        self.kind
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Leave the page. In-flight requests still complete but their results are dropped.
    pub fn unmount(&self) {
        debug!(kind = self.kind.label(), "unmounting case page");
        self.lock().mounted = false;
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the collection and replace the store with it. A failed fetch keeps the
    /// previously loaded cases.
    pub async fn load(&self) -> Notification {
        {
            let mut state = self.lock();
            if !state.mounted {
                return Notification::Discarded;
            }
            state.loading = true;
        }

        let result = self.api.list(self.kind).await;

        let mut state = self.lock();
        state.loading = false;
        if !state.mounted {
            return Notification::Discarded;
        }

        match result {
            Ok(records) => {
                let count = records.len();
                let PageState {
                    store, reconciler, ..
                } = &mut *state;
                store.replace_all(records);
                reconciler.retain_loaded(store);
                info!(kind = self.kind.label(), count, "case list loaded");
                Notification::Success(format!("Loaded {count} {} cases", self.kind))
            }
            Err(err) => {
                warn!(kind = self.kind.label(), error = %err, "case list failed to load");
                Notification::Error(err.to_string())
            }
        }
    }

    pub async fn refresh(&self) -> Notification {
        self.load().await
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.lock().view.criteria().clone()
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.lock().view.set_criteria(criteria);
    }

    pub fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        self.lock()
            .view
            .update_criteria(|criteria| criteria.search_term = term);
    }

    pub fn set_handler(&self, handler_id: Option<String>) {
        self.lock()
            .view
            .update_criteria(|criteria| criteria.handler_id = handler_id);
    }

    pub fn set_status(&self, status: Option<CaseStatus>) {
        self.lock()
            .view
            .update_criteria(|criteria| criteria.status = status);
    }

    pub fn set_type(&self, type_name: Option<String>) {
        self.lock()
            .view
            .update_criteria(|criteria| criteria.type_name = type_name);
    }

    pub fn set_customer(&self, customer_id: Option<String>) {
        self.lock()
            .view
            .update_criteria(|criteria| criteria.customer_id = customer_id);
    }

    pub fn set_date_range(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.lock().view.update_criteria(|criteria| {
            criteria.date_from = from;
            criteria.date_to = to;
        });
    }

    pub fn clear_filters(&self) {
        self.set_criteria(FilterCriteria::default());
    }

    pub fn set_page(&self, page: usize) {
        self.lock().view.set_page(page);
    }

    pub fn action_state(&self, id: &CaseId) -> ActionState {
        self.lock().reconciler.state(id)
    }

    pub fn record(&self, id: &CaseId) -> Option<CaseRecord> {
        self.lock().store.get(id).cloned()
    }

    /// Form state for the edit modal of `id`.
    pub fn edit_draft(&self, id: &CaseId) -> Option<CaseDraft> {
        self.lock().store.get(id).map(CaseDraft::from_record)
    }

    pub fn catalog(&self) -> EvaluationCatalog {
        self.lock().catalog.clone()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let state = self.lock();
        let slice = state.view.page_of(state.store.cases());
        let rows = slice
            .items
            .iter()
            .map(|record| {
                CaseRow::derive(
                    record,
                    self.kind,
                    state.formula,
                    state.reconciler.state(&record.id),
                )
            })
            .collect();

        PageSnapshot {
            kind: self.kind,
            criteria: state.view.criteria().clone(),
            rows,
            page: slice.page,
            page_size: slice.page_size,
            page_count: slice.page_count,
            total: slice.total,
            loading: state.loading,
            saving: state.saving,
        }
    }

    /// Validate and submit the create form. Refused while another create is being saved.
    pub async fn create(&self, draft: &CaseDraft) -> Notification {
        let payload = {
            let mut state = self.lock();
            if !state.mounted {
                return Notification::Discarded;
            }
            if state.saving {
                return Notification::Error("A case is already being saved".to_string());
            }
            let payload = match draft.to_payload(&state.catalog, Utc::now()) {
                Ok(payload) => payload,
                Err(err) => return Notification::Error(err.to_string()),
            };
            state.saving = true;
            payload
        };

        let result = self.api.create(self.kind, &payload).await;

        let mut state = self.lock();
        state.saving = false;
        if !state.mounted {
            return Notification::Discarded;
        }

        match result {
            Ok(record) => {
                info!(kind = self.kind.label(), case_id = %record.id, "case created");
                let PageState {
                    store, reconciler, ..
                } = &mut *state;
                reconciler.created(store, record);
                Notification::Success("Case created".to_string())
            }
            Err(err) => {
                warn!(kind = self.kind.label(), error = %err, "case create failed");
                Notification::Error(err.to_string())
            }
        }
    }

    /// Submit the edit form for `id`. An untouched requester evaluation is left out of the
    /// request so the stored scores are kept.
    pub async fn update(&self, id: &CaseId, draft: &CaseDraft) -> Notification {
        let payload = {
            let state = self.lock();
            match draft.to_payload(&state.catalog, Utc::now()) {
                Ok(payload) => payload,
                Err(err) => return Notification::Error(err.to_string()),
            }
        };
        if let Err(notification) = self.begin(id, CaseAction::Update) {
            return notification;
        }

        let result = self.api.update(self.kind, id, &payload).await;
        self.settle(id, CaseAction::Update, result)
    }

    /// Submit the handler evaluation for `id`; all four answers are required.
    pub async fn evaluate(
        &self,
        id: &CaseId,
        selection: &EvaluationSelection,
        notes: Option<String>,
    ) -> Notification {
        let submission = {
            let state = self.lock();
            match selection.resolve_handler(&state.catalog, notes, Utc::now()) {
                Ok(submission) => submission,
                Err(err) => return Notification::Error(err.to_string()),
            }
        };
        if let Err(notification) = self.begin(id, CaseAction::Evaluate) {
            return notification;
        }

        let result = self.api.evaluate(self.kind, id, &submission).await;
        self.settle(id, CaseAction::Evaluate, result)
    }

    pub async fn set_in_progress(&self, id: &CaseId) -> Notification {
        if let Err(notification) = self.begin(id, CaseAction::SetInProgress) {
            return notification;
        }
        let result = self.api.set_in_progress(self.kind, id).await;
        self.settle(id, CaseAction::SetInProgress, result)
    }

    pub async fn close(&self, id: &CaseId) -> Notification {
        if let Err(notification) = self.begin(id, CaseAction::Close) {
            return notification;
        }
        let result = self.api.close(self.kind, id).await;
        self.settle(id, CaseAction::Close, result)
    }

    pub async fn delete(&self, id: &CaseId) -> Notification {
        if let Err(notification) = self.begin(id, CaseAction::Delete) {
            return notification;
        }

        let result = self.api.delete(self.kind, id).await;

        let mut state = self.lock();
        if !state.mounted {
            return Notification::Discarded;
        }
        match result {
            Ok(()) => {
                let PageState {
                    store, reconciler, ..
                } = &mut *state;
                reconciler.deleted(store, id);
                info!(kind = self.kind.label(), case_id = %id, "case deleted");
                Notification::Success("Case deleted".to_string())
            }
            Err(err) => failure(&mut state.reconciler, id, CaseAction::Delete, &err),
        }
    }

    fn begin(&self, id: &CaseId, action: CaseAction) -> Result<(), Notification> {
        let mut state = self.lock();
        if !state.mounted {
            return Err(Notification::Discarded);
        }
        let Some(record) = state.store.get(id) else {
            return Err(Notification::Error(format!("Case {id} is not loaded")));
        };
        if matches!(action, CaseAction::SetInProgress | CaseAction::Close)
            && record.status.is_terminal()
        {
            return Err(Notification::Error(format!(
                "Case {id} is already {}",
                record.status.label_for(self.kind).to_lowercase()
            )));
        }
        state
            .reconciler
            .begin(id, action)
            .map_err(|err| Notification::Error(err.to_string()))
    }

    fn settle(
        &self,
        id: &CaseId,
        action: CaseAction,
        result: Result<CaseRecord, ApiError>,
    ) -> Notification {
        let mut state = self.lock();
        if !state.mounted {
            return Notification::Discarded;
        }
        match result {
            Ok(record) => {
                let PageState {
                    store, reconciler, ..
                } = &mut *state;
                if !reconciler.saved(store, id, action, record) {
                    return Notification::Discarded;
                }
                info!(kind = self.kind.label(), case_id = %id, action = action.label(), "case saved");
                Notification::Success(success_message(action).to_string())
            }
            Err(err) => failure(&mut state.reconciler, id, action, &err),
        }
    }
}

impl<A> CasePage<A>
where
    A: CaseApi + DirectoryApi,
{
    /// Replace the evaluation options with the configured catalog. An empty configuration
    /// selects the standard catalog; a failed lookup keeps the current one.
    pub async fn load_catalog(&self) -> Notification {
        if !self.is_mounted() {
            return Notification::Discarded;
        }

        let result = self.api.evaluation_catalog().await;

        let mut state = self.lock();
        if !state.mounted {
            return Notification::Discarded;
        }
        match result {
            Ok(entries) => {
                let count = entries.len();
                state.catalog = EvaluationCatalog::configured_or_standard(entries);
                if count == 0 {
                    debug!(kind = self.kind.label(), "no evaluation options configured");
                    return Notification::Success(
                        "Using the standard evaluation options".to_string(),
                    );
                }
                info!(kind = self.kind.label(), count, "evaluation options loaded");
                Notification::Success(format!("Loaded {count} evaluation option lists"))
            }
            Err(err) => {
                warn!(kind = self.kind.label(), error = %err, "evaluation options failed to load");
                Notification::Error(err.to_string())
            }
        }
    }
}

fn failure(
    reconciler: &mut CaseActionReconciler,
    id: &CaseId,
    action: CaseAction,
    err: &ApiError,
) -> Notification {
    warn!(case_id = %id, action = action.label(), error = %err, "case action failed");
    reconciler.failed(id, action, err.to_string());
    Notification::Error(err.to_string())
}

fn success_message(action: CaseAction) -> &'static str {
    match action {
        CaseAction::Update => "Case updated",
        CaseAction::Evaluate => "Evaluation saved",
        CaseAction::SetInProgress => "Case set in progress",
        CaseAction::Close => "Case closed",
        CaseAction::Delete => "Case deleted",
    }
}
