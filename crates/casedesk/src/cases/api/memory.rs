use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{ApiError, CaseApi, DirectoryApi};
use crate::cases::domain::{
    CaseId, CaseKind, CaseRecord, CaseStatus, Employee, LineItem, Partner, TypeRef, UserBasicInfo,
};
use crate::cases::evaluation::{CatalogEntry, HandlerEvaluationSubmission};
use crate::cases::validation::CasePayload;

/// Case API emulation backed by process memory. Resolves references against its directory,
/// assigns ids and timestamps, and applies status transitions the way the server does.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCaseApi {
    state: Arc<Mutex<BackendState>>,
}

#[derive(Debug, Default)]
struct BackendState {
    cases: HashMap<CaseKind, Vec<CaseRecord>>,
    employees: Vec<Employee>,
    partners: Vec<Partner>,
    case_types: HashMap<CaseKind, Vec<TypeRef>>,
    current_user: Option<UserBasicInfo>,
    evaluation_catalog: Vec<CatalogEntry>,
    injected_failures: VecDeque<ApiError>,
    sequence: u64,
}

impl BackendState {
    fn employee(&self, role: &str, id: &str) -> Result<Employee, ApiError> {
        self.employees
            .iter()
            .find(|employee| employee.id == id)
            .cloned()
            .ok_or_else(|| ApiError::bad_request(format!("{role} '{id}' does not exist")))
    }

    fn partner(&self, id: Option<&str>) -> Result<Option<Partner>, ApiError> {
        id.map(|id| {
            self.partners
                .iter()
                .find(|partner| partner.id == id)
                .cloned()
                .ok_or_else(|| ApiError::bad_request(format!("customer '{id}' does not exist")))
        })
        .transpose()
    }

    fn case_type(&self, kind: CaseKind, id: Option<&str>) -> Result<Option<TypeRef>, ApiError> {
        id.map(|id| {
            self.case_types
                .get(&kind)
                .and_then(|types| types.iter().find(|case_type| case_type.id == id))
                .cloned()
                .ok_or_else(|| ApiError::bad_request(format!("{kind} type '{id}' does not exist")))
        })
        .transpose()
    }

    fn case_mut(&mut self, kind: CaseKind, id: &CaseId) -> Result<&mut CaseRecord, ApiError> {
        self.cases
            .get_mut(&kind)
            .and_then(|cases| cases.iter_mut().find(|record| &record.id == id))
            .ok_or_else(|| ApiError::not_found(format!("{kind} case {id}")))
    }

    fn take_failure(&mut self) -> Result<(), ApiError> {
        match self.injected_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, kind: CaseKind) -> CaseId {
        self.sequence += 1;
        CaseId::new(format!("{}-{}", kind.label(), self.sequence))
    }

    /// Build the stored record for `payload`, keeping server-owned fields from `existing`.
    fn materialize(
        &self,
        kind: CaseKind,
        id: CaseId,
        payload: &CasePayload,
        existing: Option<&CaseRecord>,
    ) -> Result<CaseRecord, ApiError> {
        let now = Utc::now();
        let user_evaluation = match payload.user_evaluation.as_ref() {
            Some(evaluation) if !evaluation.is_empty() => evaluation.clone(),
            _ => existing
                .map(|record| record.user_evaluation.clone())
                .unwrap_or_default(),
        };

        let line_items = payload
            .line_items
            .iter()
            .enumerate()
            .map(|(index, item)| LineItem {
                id: item
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{id}-line-{}", index + 1)),
                name: item.name.clone(),
                code: item.code.clone(),
                quantity: item.quantity.max(1),
                serial_number: item.serial_number.clone(),
            })
            .collect();

        Ok(CaseRecord {
            title: payload.title.clone(),
            description: payload.description.clone(),
            crm_reference_code: payload.crm_reference_code.clone(),
            notes: payload.notes.clone(),
            requester: self.employee("requester", &payload.requester_id)?,
            handler: self.employee("handler", &payload.handler_id)?,
            customer: self.partner(payload.customer_id.as_deref())?,
            case_type: self.case_type(kind, payload.case_type_id.as_deref())?,
            status: payload.status,
            start_date: payload.start_date,
            end_date: payload.end_date,
            in_progress_at: payload.in_progress_at,
            created_at: existing.map_or(now, |record| record.created_at),
            updated_at: now,
            user_evaluation,
            handler_evaluation: existing
                .map(|record| record.handler_evaluation.clone())
                .unwrap_or_default(),
            line_items,
            id,
        })
    }
}

impl InMemoryCaseApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(self, employees: impl IntoIterator<Item = Employee>) -> Self {
        self.edit(|state| state.employees.extend(employees));
        self
    }

    pub fn with_partners(self, partners: impl IntoIterator<Item = Partner>) -> Self {
        self.edit(|state| state.partners.extend(partners));
        self
    }

    pub fn with_case_types(self, kind: CaseKind, types: impl IntoIterator<Item = TypeRef>) -> Self {
        self.edit(|state| state.case_types.entry(kind).or_default().extend(types));
        self
    }

    pub fn with_current_user(self, user: UserBasicInfo) -> Self {
        self.edit(|state| state.current_user = Some(user));
        self
    }

    pub fn with_evaluation_catalog(self, entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        self.edit(|state| state.evaluation_catalog.extend(entries));
        self
    }

    /// Store records as if they had been created earlier.
    pub fn with_cases(self, kind: CaseKind, records: impl IntoIterator<Item = CaseRecord>) -> Self {
        self.edit(|state| state.cases.entry(kind).or_default().extend(records));
        self
    }

    /// The next call fails with `err` instead of touching the stored cases.
    pub fn fail_next(&self, err: ApiError) {
        self.edit(|state| state.injected_failures.push_back(err));
    }

    pub fn cases(&self, kind: CaseKind) -> Vec<CaseRecord> {
        self.lock()
            .map(|state| state.cases.get(&kind).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn edit(&self, apply: impl FnOnce(&mut BackendState)) {
        if let Ok(mut state) = self.lock() {
            apply(&mut state);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BackendState>, ApiError> {
        self.state
            .lock()
            .map_err(|_| ApiError::Transport("in-memory case store lock poisoned".to_string()))
    }

    fn transition(
        &self,
        kind: CaseKind,
        id: &CaseId,
        status: CaseStatus,
    ) -> Result<CaseRecord, ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        let record = state.case_mut(kind, id)?;
        if record.status.is_terminal() {
            return Err(ApiError::bad_request(format!(
                "{kind} case {id} is already {}",
                record.status.label_for(kind).to_lowercase()
            )));
        }
        let now = Utc::now();
        record.transition_to(status, now);
        record.updated_at = now;
        debug!(kind = kind.label(), case_id = %id, status = status.code(), "case transitioned");
        Ok(record.clone())
    }
}

#[async_trait]
impl CaseApi for InMemoryCaseApi {
    async fn list(&self, kind: CaseKind) -> Result<Vec<CaseRecord>, ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        Ok(state.cases.get(&kind).cloned().unwrap_or_default())
    }

    async fn create(&self, kind: CaseKind, payload: &CasePayload) -> Result<CaseRecord, ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        let id = state.next_id(kind);
        let record = state.materialize(kind, id, payload, None)?;
        state
            .cases
            .entry(kind)
            .or_default()
            .push(record.clone());
        debug!(kind = kind.label(), case_id = %record.id, "case created");
        Ok(record)
    }

    async fn update(
        &self,
        kind: CaseKind,
        id: &CaseId,
        payload: &CasePayload,
    ) -> Result<CaseRecord, ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        let existing = state.case_mut(kind, id)?.clone();
        let record = state.materialize(kind, id.clone(), payload, Some(&existing))?;
        *state.case_mut(kind, id)? = record.clone();
        Ok(record)
    }

    async fn delete(&self, kind: CaseKind, id: &CaseId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        let cases = state.cases.entry(kind).or_default();
        let index = cases
            .iter()
            .position(|record| &record.id == id)
            .ok_or_else(|| ApiError::not_found(format!("{kind} case {id}")))?;
        cases.remove(index);
        Ok(())
    }

    async fn evaluate(
        &self,
        kind: CaseKind,
        id: &CaseId,
        submission: &HandlerEvaluationSubmission,
    ) -> Result<CaseRecord, ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        let record = state.case_mut(kind, id)?;
        record.handler_evaluation = submission.clone().into_evaluation();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn set_in_progress(&self, kind: CaseKind, id: &CaseId) -> Result<CaseRecord, ApiError> {
        self.transition(kind, id, CaseStatus::InProgress)
    }

    async fn close(&self, kind: CaseKind, id: &CaseId) -> Result<CaseRecord, ApiError> {
        self.transition(kind, id, CaseStatus::Completed)
    }
}

#[async_trait]
impl DirectoryApi for InMemoryCaseApi {
    async fn employees(&self) -> Result<Vec<Employee>, ApiError> {
        Ok(self.lock()?.employees.clone())
    }

    async fn partners(&self) -> Result<Vec<Partner>, ApiError> {
        Ok(self.lock()?.partners.clone())
    }

    async fn case_types(&self, kind: CaseKind) -> Result<Vec<TypeRef>, ApiError> {
        Ok(self
            .lock()?
            .case_types
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn current_user(&self) -> Result<UserBasicInfo, ApiError> {
        self.lock()?
            .current_user
            .clone()
            .ok_or_else(|| ApiError::not_found("current user"))
    }

    async fn evaluation_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        Ok(state.evaluation_catalog.clone())
    }
}
