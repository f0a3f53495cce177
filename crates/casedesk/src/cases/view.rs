use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CaseKind, CaseRecord};
use super::filter::FilterCriteria;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Timestamp a case list is ordered by, newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    StartDate,
}

impl SortField {
    pub const fn default_for(_kind: CaseKind) -> Self {
        SortField::CreatedAt
    }

    fn key(self, record: &CaseRecord) -> DateTime<Utc> {
        match self {
            SortField::CreatedAt => record.created_at,
            SortField::StartDate => record.start_date,
        }
    }

    /// Descending by the sort timestamp; ties fall back to the id so paging is stable.
    pub fn compare(self, a: &CaseRecord, b: &CaseRecord) -> Ordering {
        self.key(b)
            .cmp(&self.key(a))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// One page of a derived case list.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a> {
    pub items: Vec<&'a CaseRecord>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub page_count: usize,
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// `items[(page-1)*size .. page*size]`, clipped to the collection.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Filter, sort, and paging state of a case list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseListView {
    criteria: FilterCriteria,
    sort: SortField,
    page: usize,
    page_size: usize,
}

impl Default for CaseListView {
    fn default() -> Self {
        Self::new(SortField::default(), DEFAULT_PAGE_SIZE)
    }
}

impl CaseListView {
    pub fn new(sort: SortField, page_size: usize) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            sort,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sort(&self) -> SortField {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the criteria; any change sends the list back to page 1.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria != self.criteria {
            self.criteria = criteria;
            self.page = 1;
        }
    }

    /// Edit the criteria in place, with the same page reset as [`Self::set_criteria`].
    pub fn update_criteria(&mut self, edit: impl FnOnce(&mut FilterCriteria)) {
        let mut criteria = self.criteria.clone();
        edit(&mut criteria);
        self.set_criteria(criteria);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Filtered and sorted, before paging.
    pub fn apply<'a>(&self, records: &'a [CaseRecord]) -> Vec<&'a CaseRecord> {
        let mut filtered: Vec<&CaseRecord> = records
            .iter()
            .filter(|record| self.criteria.matches(record))
            .collect();
        filtered.sort_by(|a, b| self.sort.compare(a, b));
        filtered
    }

    /// The current page. A page past the end (after a delete or a refresh) shows the last page.
    pub fn page_of<'a>(&self, records: &'a [CaseRecord]) -> PageSlice<'a> {
        let filtered = self.apply(records);
        let total = filtered.len();
        let page_count = page_count(total, self.page_size);
        let page = self.page.min(page_count.max(1));
        let items = paginate(&filtered, page, self.page_size).to_vec();

        PageSlice {
            items,
            page,
            page_size: self.page_size,
            total,
            page_count,
        }
    }
}
