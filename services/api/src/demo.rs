use crate::infra::{parse_date, parse_kind, parse_status, seed_demo_backend};
use casedesk::cases::api::{CaseApi, HttpCaseApi};
use casedesk::cases::domain::{CaseKind, CaseStatus};
use casedesk::cases::evaluation::{EvaluationCategory, EvaluationSelection};
use casedesk::cases::filter::FilterCriteria;
use casedesk::cases::lineset::{resolve_line_items, LineField};
use casedesk::cases::page::{CasePage, Notification, PageOptions, PageSnapshot};
use casedesk::cases::validation::CaseDraft;
use casedesk::config::AppConfig;
use casedesk::error::AppError;
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    /// Case collection to list (label or resource name, e.g. `incident` or `incidents`)
    #[arg(value_parser = parse_kind)]
    pub(crate) kind: CaseKind,
    /// Free-text search over title, description, people, and customer
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Only show cases with this status (e.g. RECEIVED, IN_PROGRESS)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<CaseStatus>,
    /// Earliest start date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Latest start date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) to: Option<NaiveDate>,
    /// One-based page to print
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,
    /// Override the configured case API base URL
    #[arg(long)]
    pub(crate) base_url: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Case collection to walk through (defaults to incidents)
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: Option<CaseKind>,
    /// Rows per page in the printed snapshots
    #[arg(long)]
    pub(crate) page_size: Option<usize>,
}

pub(crate) async fn run_list(args: ListArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(base_url) = args.base_url.clone() {
        config.api.base_url = Some(base_url);
    }

    let api = Arc::new(HttpCaseApi::from_config(&config.api)?);
    let options = PageOptions::for_kind(args.kind).with_page_size(config.views.page_size);
    let page = CasePage::mount(api, args.kind, options);

    if let Notification::Error(message) = page.load_catalog().await {
        println!("Evaluation options unavailable, using the standard lists: {message}");
    }
    if let Notification::Error(message) = page.load().await {
        println!("Failed to load {} cases: {message}", args.kind);
        return Ok(());
    }

    page.set_criteria(FilterCriteria {
        search_term: args.search.unwrap_or_default(),
        status: args.status,
        date_from: args.from,
        date_to: args.to,
        ..FilterCriteria::default()
    });
    page.set_page(args.page);

    render_page(&page.snapshot());
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let kind = args.kind.unwrap_or(CaseKind::Incident);
    let api = Arc::new(seed_demo_backend(Utc::now()));
    let mut options = PageOptions::for_kind(kind);
    if let Some(page_size) = args.page_size.filter(|size| *size > 0) {
        options = options.with_page_size(page_size);
    }

    println!("== Case desk demo ({kind}) ==");
    let page = CasePage::mount(Arc::clone(&api), kind, options);
    report("Evaluation options", &page.load_catalog().await);
    report("Load", &page.load().await);
    render_page(&page.snapshot());

    println!();
    let draft = demo_draft(kind);
    report("Create", &page.create(&draft).await);

    let mut invalid = draft.clone();
    invalid.end_date = invalid.start_date;
    invalid.status = CaseStatus::Completed;
    report("Create with end date equal to start", &page.create(&invalid).await);

    let snapshot = page.snapshot();
    let Some(first) = snapshot.rows.first().map(|row| row.record.id.clone()) else {
        println!("No {kind} cases to work with.");
        return Ok(());
    };

    println!();
    report("Set in progress", &page.set_in_progress(&first).await);

    let mut selection = EvaluationSelection::default();
    selection.select(EvaluationCategory::Difficulty, "handler-difficulty-3");
    selection.select(EvaluationCategory::EstimatedTime, "handler-estimated_time-2");
    selection.select(EvaluationCategory::Impact, "handler-impact-4");
    report(
        "Evaluate with one answer missing",
        &page.evaluate(&first, &selection, None).await,
    );
    selection.select(EvaluationCategory::Urgency, "handler-urgency-5");
    report(
        "Evaluate",
        &page
            .evaluate(&first, &selection, Some("Reproduced on site".to_string()))
            .await,
    );

    if let Some(mut edit) = page.edit_draft(&first) {
        edit.notes = "Vendor contacted".to_string();
        report("Edit notes", &page.update(&first, &edit).await);
    }
    report("Close", &page.close(&first).await);

    println!();
    page.set_status(Some(CaseStatus::Completed));
    println!("Filtered to completed cases:");
    render_page(&page.snapshot());
    page.clear_filters();

    if let Some(record) = page.record(&first) {
        if kind.has_line_items() {
            let lines = resolve_line_items(&record);
            println!("Line items of {}: {}", record.id, lines.items().len());
        }
    }

    let last = page.snapshot().rows.last().map(|row| row.record.id.clone());
    if let Some(last) = last {
        report("Delete", &page.delete(&last).await);
    }

    page.unmount();
    report("Refresh after leaving the page", &page.refresh().await);

    let remaining = api.list(kind).await?;
    println!("Backend now holds {} {kind} cases.", remaining.len());
    Ok(())
}

fn demo_draft(kind: CaseKind) -> CaseDraft {
    let now = Utc::now();
    let mut draft = CaseDraft {
        title: format!("Demo {kind} case"),
        description: "Created by the case desk demo".to_string(),
        requester_id: "emp-ana".to_string(),
        handler_id: "emp-ben".to_string(),
        start_date: Some(now - Duration::hours(1)),
        ..CaseDraft::default()
    };

    match kind {
        CaseKind::Incident => draft.case_type_id = "incident-hardware".to_string(),
        CaseKind::Warranty => {
            draft.case_type_id = "warranty-repair".to_string();
            draft.customer_id = "org-northwind".to_string();
        }
        CaseKind::Internal => draft.case_type_id = "internal-audit".to_string(),
        CaseKind::Delivery | CaseKind::Receiving => {
            draft.customer_id = "org-contoso".to_string();
            let line = draft.line_items.add();
            draft.line_items.update(&line, LineField::Name, "Pallet wrap");
            draft.line_items.update(&line, LineField::Quantity, "12");
        }
    }

    for (category, points) in EvaluationCategory::SCORED.into_iter().zip([2, 3, 3, 4]) {
        draft
            .user_evaluation
            .select(category, format!("requester-{}-{points}", category.key()));
    }
    draft
        .user_evaluation
        .select(EvaluationCategory::Form, "requester-form-onsite");
    draft
}

fn report(step: &str, notification: &Notification) {
    match notification {
        Notification::Success(message) => println!("[ok]   {step}: {message}"),
        Notification::Error(message) => println!("[fail] {step}: {message}"),
        Notification::Discarded => println!("[skip] {step}: result discarded"),
    }
}

pub(crate) fn render_page(snapshot: &PageSnapshot) {
    println!(
        "{} cases: page {} of {} ({} matching)",
        snapshot.kind, snapshot.page, snapshot.page_count, snapshot.total
    );
    if snapshot.rows.is_empty() {
        println!("  (no cases)");
        return;
    }

    for row in &snapshot.rows {
        let record = &row.record;
        let evaluated = if row.handler_evaluated { "*" } else { " " };
        println!(
            "  {:<20} {:<12} {:<36} user {:>2}  handler {:>2}{} score {:>5.1}  {}",
            record.id.as_str(),
            row.status_label,
            truncate(&record.title, 36),
            row.user_total,
            row.handler_total,
            evaluated,
            row.combined_score,
            record.handler.full_name(),
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
