use super::common::*;
use crate::cases::domain::{CaseId, CaseRecord, CaseStatus};
use crate::cases::store::CaseCollectionStore;
use crate::cases::view::{page_count, paginate, CaseListView, SortField};

fn ids(records: &[&CaseRecord]) -> Vec<String> {
    records.iter().map(|record| record.id.to_string()).collect()
}

fn numbered_cases(count: u32) -> CaseCollectionStore {
    CaseCollectionStore::new(
        (1..=count)
            .map(|n| case_record(&format!("c-{n:02}"), &format!("Case {n}"), at(1 + n % 28, n % 24)))
            .collect(),
    )
}

#[test]
fn upsert_prepends_new_cases_and_the_view_sorts_newest_first() {
    let mut store = CaseCollectionStore::new(vec![
        case_record("A", "First", at(1, 9)),
        case_record("B", "Second", at(2, 9)),
    ]);

    store.upsert(case_record("C", "Third", at(3, 9)));

    let stored: Vec<&str> = store.cases().iter().map(|record| record.id.as_str()).collect();
    assert_eq!(stored, vec!["C", "A", "B"]);

    let view = CaseListView::default();
    assert_eq!(ids(&view.apply(store.cases())), vec!["C", "B", "A"]);
}

#[test]
fn upsert_replaces_existing_entries_in_place() {
    let mut store = CaseCollectionStore::new(vec![
        case_record("A", "First", at(1, 9)),
        case_record("B", "Second", at(2, 9)),
    ]);

    store.upsert(with_status(
        case_record("B", "Second", at(2, 9)),
        CaseStatus::Completed,
    ));

    assert_eq!(store.len(), 2);
    assert_eq!(store.cases()[1].status, CaseStatus::Completed);
}

#[test]
fn removing_unknown_ids_is_a_no_op() {
    let mut store = numbered_cases(3);
    let before = store.clone();

    assert!(store.remove(&CaseId::new("missing")).is_none());
    assert_eq!(store, before);

    assert!(store.remove(&CaseId::new("c-02")).is_some());
    assert_eq!(store.len(), 2);
    assert!(store.get(&CaseId::new("c-02")).is_none());
}

#[test]
fn twenty_five_cases_split_into_pages_of_ten_ten_and_five() {
    let store = numbered_cases(25);
    let mut view = CaseListView::default();

    let mut sizes = Vec::new();
    for page in 1..=3 {
        view.set_page(page);
        let slice = view.page_of(store.cases());
        assert_eq!(slice.total, 25);
        assert_eq!(slice.page_count, 3);
        sizes.push(slice.items.len());
    }
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[test]
fn criteria_changes_reset_the_page() {
    let mut view = CaseListView::default();
    view.set_page(3);

    view.update_criteria(|criteria| criteria.search_term = "printer".to_string());
    assert_eq!(view.page(), 1);

    view.set_page(2);
    view.update_criteria(|criteria| criteria.search_term = "printer".to_string());
    assert_eq!(view.page(), 2, "unchanged criteria keep the page");
}

#[test]
fn pages_past_the_end_clamp_to_the_last_page() {
    let store = numbered_cases(12);
    let mut view = CaseListView::default();
    view.set_page(9);

    let slice = view.page_of(store.cases());
    assert_eq!(slice.page, 2);
    assert_eq!(slice.items.len(), 2);

    let empty = CaseCollectionStore::default();
    let slice = view.page_of(empty.cases());
    assert_eq!(slice.page, 1);
    assert_eq!(slice.page_count, 0);
    assert!(slice.items.is_empty());
}

#[test]
fn sorting_by_start_date_breaks_ties_by_id() {
    let mut early_start = case_record("b", "Started early", at(5, 9));
    early_start.start_date = at(1, 9);
    let same_start = case_record("a", "Same start", at(1, 9));
    let records = vec![early_start, same_start, case_record("c", "Latest", at(6, 9))];

    let view = CaseListView::new(SortField::StartDate, 10);
    assert_eq!(ids(&view.apply(&records)), vec!["c", "a", "b"]);

    let by_creation = CaseListView::new(SortField::CreatedAt, 10);
    assert_eq!(ids(&by_creation.apply(&records)), vec!["c", "b", "a"]);
}

#[test]
fn slice_helpers_clip_to_the_collection() {
    let items: Vec<u32> = (1..=7).collect();
    assert_eq!(paginate(&items, 2, 5).to_vec(), vec![6u32, 7]);
    assert!(paginate(&items, 4, 5).is_empty());
    assert_eq!(page_count(7, 5), 2);
    assert_eq!(page_count(0, 5), 0);
}
