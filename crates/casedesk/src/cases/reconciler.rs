use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{CaseId, CaseRecord};
use super::store::CaseCollectionStore;

/// Row-level mutations tracked per case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseAction {
    Update,
    Evaluate,
    SetInProgress,
    Close,
    Delete,
}

impl CaseAction {
    pub const fn label(self) -> &'static str {
        match self {
            CaseAction::Update => "update",
            CaseAction::Evaluate => "evaluation",
            CaseAction::SetInProgress => "set in progress",
            CaseAction::Close => "close",
            CaseAction::Delete => "delete",
        }
    }
}

/// Request lifecycle of the latest action on one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActionState {
    Idle,
    Pending { action: CaseAction },
    Done { action: CaseAction },
    Failed { action: CaseAction, message: String },
}

impl ActionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionState::Pending { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("case {id} already has a {} request in flight", .action.label())]
    AlreadyPending { id: CaseId, action: CaseAction },
}

/// Applies confirmed mutation results to the store and tracks per-case action state.
/// The store only changes after the server confirms; failures leave it untouched.
#[derive(Debug, Clone, Default)]
pub struct CaseActionReconciler {
    states: HashMap<CaseId, ActionState>,
}

impl CaseActionReconciler {
    pub fn state(&self, id: &CaseId) -> ActionState {
        self.states.get(id).cloned().unwrap_or(ActionState::Idle)
    }

    pub fn is_pending(&self, id: &CaseId) -> bool {
        self.states.get(id).is_some_and(ActionState::is_pending)
    }

    pub fn pending_ids(&self) -> Vec<CaseId> {
        let mut ids: Vec<CaseId> = self
            .states
            .iter()
            .filter(|(_, state)| state.is_pending())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Mark `id` as pending before the request is sent. Refused while another action on the
    /// same case is in flight.
    pub fn begin(&mut self, id: &CaseId, action: CaseAction) -> Result<(), ReconcileError> {
        if let Some(ActionState::Pending { action: current }) = self.states.get(id) {
            return Err(ReconcileError::AlreadyPending {
                id: id.clone(),
                action: *current,
            });
        }
        self.states
            .insert(id.clone(), ActionState::Pending { action });
        Ok(())
    }

    /// A created case goes to the front of the store until the next sort pass.
    pub fn created(&mut self, store: &mut CaseCollectionStore, record: CaseRecord) {
        debug!(case_id = %record.id, "reconciling created case");
        store.upsert(record);
    }

    /// Replace the stored case with the server's copy. Returns false when `id` had no
    /// matching pending action, in which case nothing is applied.
    pub fn saved(
        &mut self,
        store: &mut CaseCollectionStore,
        id: &CaseId,
        action: CaseAction,
        record: CaseRecord,
    ) -> bool {
        if !self.settle(id, action) {
            return false;
        }
        store.upsert(record);
        self.states.insert(id.clone(), ActionState::Done { action });
        true
    }

    /// Drop a confirmed delete from the store and forget the case's action state.
    pub fn deleted(&mut self, store: &mut CaseCollectionStore, id: &CaseId) -> bool {
        if !self.settle(id, CaseAction::Delete) {
            return false;
        }
        store.remove(id);
        self.states.remove(id);
        true
    }

    pub fn failed(&mut self, id: &CaseId, action: CaseAction, message: impl Into<String>) -> bool {
        if !self.settle(id, action) {
            return false;
        }
        self.states.insert(
            id.clone(),
            ActionState::Failed {
                action,
                message: message.into(),
            },
        );
        true
    }

    /// Forget settled states of cases that are no longer in `store`. Pending states are kept
    /// so their results can still land.
    pub fn retain_loaded(&mut self, store: &CaseCollectionStore) {
        let before = self.states.len();
        self.states
            .retain(|id, state| state.is_pending() || store.get(id).is_some());
        let pruned = before - self.states.len();
        if pruned > 0 {
            debug!(pruned, "pruned action states of unloaded cases");
        }
    }

    fn settle(&self, id: &CaseId, action: CaseAction) -> bool {
        match self.states.get(id) {
            Some(ActionState::Pending { action: pending }) if *pending == action => true,
            other => {
                warn!(case_id = %id, ?action, state = ?other, "ignoring unsolicited action result");
                false
            }
        }
    }
}
