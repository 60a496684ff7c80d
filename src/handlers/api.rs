use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Duration, Local, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::db::queries::{categories as category_queries, dishes, transactions};
use crate::error::{AppError, AppResult};
use crate::models::{Category, TransactionKind};
use crate::services::reports::{
    self, CategoryRollup, DailyBucket, DishSales, MenuStats, MonthlyBucket, RevenueSlice,
    RevenueSplit, DAILY_WINDOW_DAYS, TOP_DISHES_LIMIT,
};
use crate::state::AppState;

/// Longest trailing window the daily revenue endpoint serves.
pub const MAX_DAILY_WINDOW_DAYS: u32 = 31;

#[derive(Debug, Deserialize)]
pub struct DailyRevenueParams {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub profit_cents: i64,
    pub veg_revenue_cents: i64,
    pub non_veg_revenue_cents: i64,
    pub total_dishes: i64,
    pub veg_dishes: i64,
    pub non_veg_dishes: i64,
}

impl DashboardSummary {
    fn new(split: RevenueSplit, menu: MenuStats) -> Self {
        Self {
            income_cents: split.income_cents,
            expense_cents: split.expense_cents,
            profit_cents: split.profit_cents(),
            veg_revenue_cents: split.veg_revenue_cents,
            non_veg_revenue_cents: split.non_veg_revenue_cents,
            total_dishes: menu.total_dishes,
            veg_dishes: menu.veg_dishes,
            non_veg_dishes: menu.non_veg_dishes,
        }
    }
}

pub async fn monthly_trends(State(state): State<AppState>) -> AppResult<Json<Vec<MonthlyBucket>>> {
    let rows = state
        .read(|conn| Ok(transactions::list_transactions(conn, &Default::default())?))
        .await?;

    Ok(Json(reports::monthly_trends(&rows)))
}

pub async fn veg_split(State(state): State<AppState>) -> AppResult<Json<Vec<RevenueSlice>>> {
    let filter = transactions::TransactionFilter {
        kind: Some(TransactionKind::Income),
        ..Default::default()
    };
    let rows = state
        .read(move |conn| Ok(transactions::list_transactions(conn, &filter)?))
        .await?;

    Ok(Json(RevenueSplit::from_transactions(&rows).slices()))
}

pub async fn daily_revenue(
    State(state): State<AppState>,
    Query(params): Query<DailyRevenueParams>,
) -> AppResult<Json<Vec<DailyBucket>>> {
    let days = params.days.unwrap_or(DAILY_WINDOW_DAYS);
    if !(1..=MAX_DAILY_WINDOW_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {}",
            MAX_DAILY_WINDOW_DAYS
        )));
    }

    let today = Local::now().date_naive();
    let first_day = today - Duration::days(i64::from(days) - 1);
    let filter = transactions::TransactionFilter {
        kind: Some(TransactionKind::Income),
        from: Some(first_day.and_time(NaiveTime::MIN)),
        until: Some((today + Duration::days(1)).and_time(NaiveTime::MIN)),
        ..Default::default()
    };
    let rows = state
        .read(move |conn| Ok(transactions::list_transactions(conn, &filter)?))
        .await?;

    Ok(Json(reports::daily_revenue(&rows, today, days)))
}

pub async fn top_dishes(State(state): State<AppState>) -> AppResult<Json<Vec<DishSales>>> {
    let filter = transactions::TransactionFilter {
        kind: Some(TransactionKind::Income),
        ..Default::default()
    };
    let rows = state
        .read(move |conn| Ok(transactions::list_transactions(conn, &filter)?))
        .await?;

    Ok(Json(reports::top_dishes(&rows, TOP_DISHES_LIMIT)))
}

pub async fn category_breakdown(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryRollup>>> {
    let dish_list = state
        .read(|conn| Ok(dishes::list_dishes(conn, &Default::default())?))
        .await?;

    Ok(Json(reports::category_breakdown(&dish_list)))
}

pub async fn dashboard_summary(State(state): State<AppState>) -> AppResult<Json<DashboardSummary>> {
    let (transaction_list, dish_list) = tokio::try_join!(
        state.read(|conn| Ok(transactions::list_transactions(conn, &Default::default())?)),
        state.read(|conn| Ok(dishes::list_dishes(conn, &Default::default())?)),
    )?;

    Ok(Json(DashboardSummary::new(
        RevenueSplit::from_transactions(&transaction_list),
        MenuStats::from_dishes(&dish_list),
    )))
}

pub async fn categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let list = state
        .read(|conn| Ok(category_queries::list_categories(conn)?))
        .await?;

    Ok(Json(list))
}
