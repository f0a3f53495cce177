use super::domain::{CaseId, CaseRecord};

/// The full fetched collection for one case kind. Order is insertion order; sorting is
/// the derived view's concern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseCollectionStore {
    cases: Vec<CaseRecord>,
}

impl CaseCollectionStore {
    pub fn new(cases: Vec<CaseRecord>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, id: &CaseId) -> Option<&CaseRecord> {
        self.cases.iter().find(|record| &record.id == id)
    }

    /// Total replacement after a refresh.
    pub fn replace_all(&mut self, cases: Vec<CaseRecord>) {
        self.cases = cases;
    }

    /// Replace the entry with the same id in place, or prepend when absent.
    pub fn upsert(&mut self, record: CaseRecord) {
        match self.cases.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => self.cases.insert(0, record),
        }
    }

    /// Drop the entry with `id`. Returns the removed record, if any.
    pub fn remove(&mut self, id: &CaseId) -> Option<CaseRecord> {
        let index = self.cases.iter().position(|record| &record.id == id)?;
        Some(self.cases.remove(index))
    }
}
