use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use tracing::debug;

use crate::db::queries::{dishes, transactions};
use crate::error::{AppResult, RenderHtml};
use crate::handlers::transactions::{SummaryCards, TransactionRow};
use crate::handlers::Layout;
use crate::notice::NoticeParams;
use crate::services::reports::{MenuStats, RevenueSplit};
use crate::state::AppState;

/// Number of transactions listed under "Recent Transactions".
const RECENT_LIMIT: usize = 5;

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub summary: SummaryCards,
    pub menu: MenuStats,
    pub veg_revenue: String,
    pub non_veg_revenue: String,
    /// The most recent transactions, newest first.
    pub rows: Vec<TransactionRow>,
    pub deletable: bool,
    pub transaction_count: usize,
}

pub async fn index(
    State(state): State<AppState>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    debug!("Loading dashboard");

    let (transaction_list, dish_list) = tokio::try_join!(
        state.read(|conn| Ok(transactions::list_transactions(conn, &Default::default())?)),
        state.read(|conn| Ok(dishes::list_dishes(conn, &Default::default())?)),
    )?;

    let split = RevenueSplit::from_transactions(&transaction_list);
    let menu = MenuStats::from_dishes(&dish_list);

    debug!(
        transaction_count = transaction_list.len(),
        income_cents = split.income_cents,
        expense_cents = split.expense_cents,
        total_dishes = menu.total_dishes,
        "Dashboard data loaded"
    );

    // rows arrive newest first
    let recent_transactions = transaction_list
        .iter()
        .take(RECENT_LIMIT)
        .map(|t| TransactionRow::new(&state, t))
        .collect();

    let template = DashboardTemplate {
        layout: Layout::new(&state, "Dashboard", "/", notice.into_notice()),
        summary: SummaryCards::new(&state, &split),
        menu,
        veg_revenue: state.format_money(split.veg_revenue_cents),
        non_veg_revenue: state.format_money(split.non_veg_revenue_cents),
        rows: recent_transactions,
        deletable: false,
        transaction_count: transaction_list.len(),
    };

    template.render_html()
}
