use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::Session;
use crate::db::queries::workers;
use crate::error::{AppError, AppResult, RenderHtml};
use crate::filters::cents_to_input;
use crate::form_utils::{deserialize_optional_string, parse_amount_cents, require_text};
use crate::handlers::Layout;
use crate::models::{MonthKey, NewWorker, Worker};
use crate::notice::{failure_redirect, redirect_with, Notice, NoticeParams};
use crate::services::payroll::{effective_months, PayrollSummary};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WorkerListParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub month: Option<String>,
}

impl WorkerListParams {
    fn month_key(&self) -> AppResult<Option<MonthKey>> {
        self.month
            .as_deref()
            .map(|m| m.parse::<MonthKey>().map_err(AppError::Validation))
            .transpose()
    }
}

pub struct WorkerRow {
    pub id: i64,
    pub name: String,
    pub designation: String,
    pub payment: String,
    pub effective_date: String,
}

impl WorkerRow {
    fn new(state: &AppState, w: &Worker) -> Self {
        Self {
            id: w.id,
            name: w.name.clone(),
            designation: w.designation.clone(),
            payment: state.format_money(w.payment_cents),
            effective_date: w.effective_date_display(),
        }
    }
}

pub struct MonthOption {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "pages/workers.html")]
pub struct WorkersTemplate {
    pub layout: Layout,
    pub workers: Vec<WorkerRow>,
    pub months: Vec<MonthOption>,
    pub has_month: bool,
    pub month_label: String,
    pub worker_count: i64,
    pub total_payroll: String,
    pub today: String,
}

#[derive(Template)]
#[template(path = "pages/worker_form.html")]
pub struct WorkerFormTemplate {
    pub layout: Layout,
    pub id: i64,
    pub name: String,
    pub designation: String,
    pub payment: String,
    pub effective_date: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkerFormData {
    pub name: String,
    pub designation: String,
    pub payment: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub effective_date: Option<String>,
}

impl WorkerFormData {
    /// Validate the form. `today` is used when no effective date was submitted.
    pub fn to_new_worker(&self, today: NaiveDate) -> AppResult<NewWorker> {
        let effective_date = match &self.effective_date {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::Validation(format!("Invalid effective date '{}'", raw)))?,
            None => today,
        };

        Ok(NewWorker {
            name: require_text(&self.name, "Name")?,
            designation: require_text(&self.designation, "Designation")?,
            payment_cents: parse_amount_cents(&self.payment, "Payment")?,
            effective_date,
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<WorkerListParams>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let month = params.month_key()?;
    let filter = workers::WorkerFilter { month };

    let (listed, everyone) = tokio::try_join!(
        state.read(move |conn| Ok(workers::list_workers(conn, &filter)?)),
        state.read(|conn| Ok(workers::list_workers(conn, &Default::default())?)),
    )?;

    let summary = PayrollSummary::from_workers(&listed);
    debug!(
        month = ?month.map(|m| m.key()),
        count = summary.worker_count,
        "Workers loaded"
    );

    let months = effective_months(&everyone)
        .into_iter()
        .map(|m| MonthOption {
            key: m.key(),
            label: m.long_label(),
            selected: Some(m) == month,
        })
        .collect();

    let template = WorkersTemplate {
        layout: Layout::new(&state, "Workers", "/workers", notice.into_notice()),
        workers: listed.iter().map(|w| WorkerRow::new(&state, w)).collect(),
        months,
        has_month: month.is_some(),
        month_label: month.map(|m| m.long_label()).unwrap_or_default(),
        worker_count: summary.worker_count,
        total_payroll: state.format_money(summary.total_payment_cents),
        today: Local::now().date_naive().format("%Y-%m-%d").to_string(),
    };

    template.render_html()
}

pub async fn create(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<WorkerFormData>,
) -> Redirect {
    debug!(name = %form.name, "Creating worker");

    let result = form
        .to_new_worker(Local::now().date_naive())
        .and_then(|worker| {
            let conn = state.db.get()?;
            Ok(workers::create_worker(&conn, &worker)?)
        });

    match result {
        Ok(id) => {
            info!(worker_id = id, session_started = %session.created_at, "Worker added");
            redirect_with("/workers", Notice::success("Worker added successfully"))
        }
        Err(e) => failure_redirect(e, "/workers", "Failed to save worker"),
    }
}

pub async fn edit_form(
    _session: Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let worker = state
        .read(move |conn| Ok(workers::get_worker(conn, id)?))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", id)))?;

    let template = WorkerFormTemplate {
        layout: Layout::new(&state, "Edit Worker", "/workers", notice.into_notice()),
        id: worker.id,
        name: worker.name,
        designation: worker.designation,
        payment: cents_to_input(worker.payment_cents),
        effective_date: worker.effective_date.format("%Y-%m-%d").to_string(),
    };

    template.render_html()
}

pub async fn update(
    _session: Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<WorkerFormData>,
) -> Redirect {
    debug!(worker_id = id, "Updating worker");

    let result = form
        .to_new_worker(Local::now().date_naive())
        .and_then(|worker| {
            let conn = state.db.get()?;
            if !workers::update_worker(&conn, id, &worker)? {
                return Err(AppError::NotFound(format!("Worker {} not found", id)));
            }
            Ok(())
        });

    match result {
        Ok(()) => {
            info!(worker_id = id, "Worker updated");
            redirect_with("/workers", Notice::success("Worker updated successfully"))
        }
        Err(e) => failure_redirect(e, &format!("/workers/{}/edit", id), "Failed to save worker"),
    }
}

pub async fn delete(
    _session: Session,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Html<String>> {
    info!(worker_id = id, "Deleting worker");
    let conn = state.db.get()?;

    if !workers::delete_worker(&conn, id)? {
        return Err(AppError::NotFound(format!("Worker {} not found", id)));
    }

    Ok(Html(String::new()))
}
