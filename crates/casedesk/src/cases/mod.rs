//! Case list/detail view model: the fetched collection, its derived filtered and paginated
//! view, the two-party evaluation lifecycle, row action reconciliation, and inline product
//! line sets.

pub mod api;
pub mod domain;
pub mod evaluation;
pub mod filter;
pub mod lineset;
pub mod page;
pub mod reconciler;
pub mod router;
pub mod store;
pub mod validation;
pub mod view;

#[cfg(test)]
mod tests;

pub use api::{ApiError, CaseApi, DirectoryApi, HttpCaseApi, InMemoryCaseApi};
pub use domain::{
    CaseId, CaseKind, CaseRecord, CaseStatus, EmployeeRef, HandlerEvaluation, LineItem,
    OrganizationRef, TypeRef, UserEvaluation,
};
pub use evaluation::{
    combined_score, handler_total, is_handler_evaluated, user_total, EvaluationCatalog,
    EvaluationCategory, EvaluationRole, EvaluationSelection, HandlerEvaluationSubmission,
    ScoreFormula,
};
pub use filter::FilterCriteria;
pub use lineset::{resolve_line_items, LineField, ProductLineset, ResolvedLineItems};
pub use page::{CasePage, CaseRow, Notification, PageOptions, PageSnapshot};
pub use reconciler::{ActionState, CaseAction, CaseActionReconciler, ReconcileError};
pub use router::case_view_router;
pub use store::CaseCollectionStore;
pub use validation::{validate_timeline, CaseDraft, CasePayload, ValidationError};
pub use view::{CaseListView, PageSlice, SortField, DEFAULT_PAGE_SIZE};
