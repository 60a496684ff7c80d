use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Local;
use tracing::debug;

use crate::db::queries::{dishes, transactions};
use crate::error::{AppResult, RenderHtml};
use crate::handlers::Layout;
use crate::notice::NoticeParams;
use crate::services::reports::{bar_width, Report};
use crate::state::AppState;

/// One labelled bar of a horizontal bar chart.
pub struct Bar {
    pub label: String,
    pub value: String,
    pub width: i64,
}

pub struct MonthRow {
    pub label: String,
    pub income: Bar,
    pub expense: Bar,
}

pub struct SliceRow {
    pub name: &'static str,
    pub value: String,
    pub percentage: i64,
    pub is_veg: bool,
}

pub struct TopDishRow {
    pub rank: usize,
    pub name: String,
    pub badge: &'static str,
    pub revenue: String,
    pub order_count: i64,
}

pub struct CategoryRow {
    pub name: String,
    pub dish_count: i64,
    pub veg_count: i64,
    pub non_veg_count: i64,
}

#[derive(Template)]
#[template(path = "pages/reports.html")]
pub struct ReportsTemplate {
    pub layout: Layout,
    pub income: String,
    pub expense: String,
    pub profit_html: String,
    pub monthly: Vec<MonthRow>,
    pub slices: Vec<SliceRow>,
    pub has_dish_revenue: bool,
    pub daily: Vec<Bar>,
    pub top_dishes: Vec<TopDishRow>,
    pub categories: Vec<CategoryRow>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let (transaction_list, dish_list) = tokio::try_join!(
        state.read(|conn| Ok(transactions::list_transactions(conn, &Default::default())?)),
        state.read(|conn| Ok(dishes::list_dishes(conn, &Default::default())?)),
    )?;

    let report = Report::build(&transaction_list, &dish_list, Local::now().date_naive());
    debug!(
        months = report.monthly.len(),
        top_dishes = report.top_dishes.len(),
        categories = report.categories.len(),
        "Report built"
    );

    let max_monthly = report.max_monthly_cents();
    let monthly = report
        .monthly
        .iter()
        .map(|m| MonthRow {
            label: m.label.clone(),
            income: Bar {
                label: "Income".into(),
                value: state.format_money(m.income_cents),
                width: bar_width(m.income_cents, max_monthly),
            },
            expense: Bar {
                label: "Expense".into(),
                value: state.format_money(m.expense_cents),
                width: bar_width(m.expense_cents, max_monthly),
            },
        })
        .collect();

    let max_daily = report.max_daily_cents();
    let daily = report
        .daily
        .iter()
        .map(|d| Bar {
            label: d.label.clone(),
            value: state.format_money(d.revenue_cents),
            width: bar_width(d.revenue_cents, max_daily),
        })
        .collect();

    let slices = report
        .split
        .slices()
        .into_iter()
        .map(|s| SliceRow {
            name: s.name,
            value: state.format_money(s.value_cents),
            percentage: s.percentage,
            is_veg: s.kind.is_veg(),
        })
        .collect();

    let top_dishes = report
        .top_dishes
        .iter()
        .enumerate()
        .map(|(i, d)| TopDishRow {
            rank: i + 1,
            name: d.name.clone(),
            badge: d.kind.badge(),
            revenue: state.format_money(d.revenue_cents),
            order_count: d.order_count,
        })
        .collect();

    let categories = report
        .categories
        .iter()
        .map(|c| CategoryRow {
            name: c.name.clone(),
            dish_count: c.dish_count,
            veg_count: c.veg_count,
            non_veg_count: c.non_veg_count,
        })
        .collect();

    let template = ReportsTemplate {
        layout: Layout::new(&state, "Reports", "/reports", notice.into_notice()),
        income: state.format_money(report.split.income_cents),
        expense: state.format_money(report.split.expense_cents),
        profit_html: state.format_money_colored(report.split.profit_cents()),
        monthly,
        slices,
        has_dish_revenue: report.split.dish_revenue_cents() > 0,
        daily,
        top_dishes,
        categories,
    };

    template.render_html()
}
