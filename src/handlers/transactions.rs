use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::queries::{dishes, parse_timestamp, transactions};
use crate::error::{AppError, AppResult, RenderHtml};
use crate::form_utils::{
    deserialize_optional_i64, deserialize_optional_string, parse_amount_cents, require_text,
};
use crate::handlers::Layout;
use crate::models::{NewTransaction, TransactionKind, TransactionWithDish};
use crate::notice::{failure_redirect, redirect_with, Notice, NoticeParams};
use crate::services::reports::RevenueSplit;
use crate::state::AppState;

/// A transaction prepared for display in a table row.
pub struct TransactionRow {
    pub id: i64,
    pub is_income: bool,
    pub kind_label: &'static str,
    pub description: String,
    pub dish_label: String,
    pub date_display: String,
    pub amount_display: String,
}

impl TransactionRow {
    pub fn new(state: &AppState, row: &TransactionWithDish) -> Self {
        let tx = &row.transaction;
        let sign = if tx.kind.is_income() { "+" } else { "-" };
        Self {
            id: tx.id,
            is_income: tx.kind.is_income(),
            kind_label: tx.kind.label(),
            description: tx.description.clone(),
            dish_label: row.dish_label(),
            date_display: row.date_display(),
            amount_display: format!("{}{}", sign, state.format_money(tx.amount_cents)),
        }
    }
}

/// Summary cards shared by the transactions page and the dashboard.
pub struct SummaryCards {
    pub income: String,
    pub expense: String,
    pub profit_html: String,
    pub profit_negative: bool,
}

impl SummaryCards {
    pub fn new(state: &AppState, split: &RevenueSplit) -> Self {
        Self {
            income: state.format_money(split.income_cents),
            expense: state.format_money(split.expense_cents),
            profit_html: state.format_money_colored(split.profit_cents()),
            profit_negative: split.profit_cents() < 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl KindFilter {
    fn matches(&self, kind: TransactionKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Income => kind == TransactionKind::Income,
            KindFilter::Expense => kind == TransactionKind::Expense,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            KindFilter::All => "all",
            KindFilter::Income => "income",
            KindFilter::Expense => "expense",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    #[serde(default)]
    pub kind: KindFilter,
}

pub struct FilterTab {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "pages/transactions.html")]
pub struct TransactionsTemplate {
    pub layout: Layout,
    pub summary: SummaryCards,
    pub tabs: Vec<FilterTab>,
    pub rows: Vec<TransactionRow>,
    pub deletable: bool,
    pub total_count: usize,
}

pub struct DishOption {
    pub id: i64,
    pub label: String,
    pub price_input: String,
}

#[derive(Template)]
#[template(path = "pages/transaction_form.html")]
pub struct TransactionFormTemplate {
    pub layout: Layout,
    pub dishes: Vec<DishOption>,
    pub today: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionFormData {
    pub kind: String,
    pub amount: String,
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub dish_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub date: Option<String>,
}

impl TransactionFormData {
    /// Validate the form. `now` is used when no date was submitted.
    pub fn to_new_transaction(&self, now: NaiveDateTime) -> AppResult<NewTransaction> {
        let kind: TransactionKind = self
            .kind
            .parse()
            .map_err(|_| AppError::Validation("Type must be income or expense".into()))?;
        let amount_cents = parse_amount_cents(&self.amount, "Amount")?;
        let description = require_text(&self.description, "Description")?;

        // quantity only means something for a dish sale
        let quantity = match (self.dish_id, self.quantity) {
            (Some(_), Some(qty)) if qty <= 0 => {
                return Err(AppError::Validation("Quantity must be at least 1".into()))
            }
            (Some(_), Some(qty)) => Some(qty),
            (Some(_), None) => Some(1),
            (None, _) => None,
        };

        let timestamp = match &self.date {
            Some(raw) => parse_timestamp(raw)
                .map_err(|_| AppError::Validation(format!("Invalid date '{}'", raw)))?,
            None => now,
        };

        Ok(NewTransaction {
            kind,
            amount_cents,
            description,
            dish_id: self.dish_id,
            quantity,
            timestamp,
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let all = state
        .read(|conn| Ok(transactions::list_transactions(conn, &Default::default())?))
        .await?;

    // summary always covers every row, whatever the filter
    let split = RevenueSplit::from_transactions(&all);
    let rows: Vec<TransactionRow> = all
        .iter()
        .filter(|t| params.kind.matches(t.transaction.kind))
        .map(|t| TransactionRow::new(&state, t))
        .collect();

    debug!(
        filter = params.kind.as_str(),
        shown = rows.len(),
        total = all.len(),
        "Transactions loaded"
    );

    let tabs = [
        (KindFilter::All, "All"),
        (KindFilter::Income, "Income"),
        (KindFilter::Expense, "Expense"),
    ]
    .into_iter()
    .map(|(kind, label)| FilterTab {
        href: format!("/transactions?kind={}", kind.as_str()),
        label,
        active: kind == params.kind,
    })
    .collect();

    let template = TransactionsTemplate {
        layout: Layout::new(&state, "Transactions", "/transactions", notice.into_notice()),
        summary: SummaryCards::new(&state, &split),
        tabs,
        rows,
        deletable: true,
        total_count: all.len(),
    };

    template.render_html()
}

pub async fn new_form(
    State(state): State<AppState>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let filter = dishes::DishFilter {
        available_only: true,
        ..Default::default()
    };
    let available = state
        .read(move |conn| Ok(dishes::list_dishes(conn, &filter)?))
        .await?;

    let dish_options = available
        .iter()
        .map(|d| DishOption {
            id: d.dish.id,
            label: format!(
                "{} {} ({})",
                d.dish.kind.badge(),
                d.dish.name,
                state.format_money(d.dish.price_cents)
            ),
            price_input: crate::filters::cents_to_input(d.dish.price_cents),
        })
        .collect();

    let template = TransactionFormTemplate {
        layout: Layout::new(&state, "Add Transaction", "/transactions", notice.into_notice()),
        dishes: dish_options,
        today: Local::now().format("%Y-%m-%dT%H:%M").to_string(),
    };

    template.render_html()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<TransactionFormData>,
) -> Redirect {
    debug!(kind = %form.kind, amount = %form.amount, "Creating transaction");

    match create_transaction(&state, &form) {
        Ok((id, kind)) => {
            info!(transaction_id = id, kind = %kind, "Transaction recorded via web form");
            redirect_with(
                "/transactions",
                Notice::success(format!("{} recorded successfully", kind.label())),
            )
        }
        Err(e) => failure_redirect(e, "/transactions/new", "Failed to save transaction"),
    }
}

fn create_transaction(
    state: &AppState,
    form: &TransactionFormData,
) -> AppResult<(i64, TransactionKind)> {
    let new_tx = form.to_new_transaction(Local::now().naive_local())?;
    let conn = state.db.get()?;

    if let Some(dish_id) = new_tx.dish_id {
        if !dishes::dish_exists(&conn, dish_id)? {
            return Err(AppError::Validation(
                "The selected dish no longer exists".into(),
            ));
        }
    }

    let id = transactions::create_transaction(&conn, &new_tx)?;
    Ok((id, new_tx.kind))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    info!(transaction_id = id, "Deleting transaction");
    let conn = state.db.get()?;

    if !transactions::delete_transaction(&conn, id)? {
        return Err(AppError::NotFound(format!("Transaction {} not found", id)));
    }

    Ok(Html(String::new()))
}
