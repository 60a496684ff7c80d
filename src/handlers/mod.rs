pub mod api;
pub mod dashboard;
pub mod menu;
pub mod reports;
pub mod transactions;
pub mod workers;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::config::AuthMode;
use crate::notice::Notice;
use crate::state::AppState;
use crate::VERSION;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(dashboard::index))
        .route("/menu", get(menu::index))
        .route("/transactions", get(transactions::index))
        .route("/workers", get(workers::index))
        .route("/reports", get(reports::index))
        // Menu
        .route("/menu/new", get(menu::new_form))
        .route("/menu/create", post(menu::create))
        .route("/menu/:id/edit", get(menu::edit_form))
        .route("/menu/:id/update", post(menu::update))
        .route("/menu/:id/toggle", post(menu::toggle))
        .route("/menu/:id", delete(menu::delete))
        // Transactions
        .route("/transactions/new", get(transactions::new_form))
        .route("/transactions/create", post(transactions::create))
        .route("/transactions/:id", delete(transactions::delete))
        // Workers
        .route("/workers/create", post(workers::create))
        .route("/workers/:id/edit", get(workers::edit_form))
        .route("/workers/:id/update", post(workers::update))
        .route("/workers/:id", delete(workers::delete))
        // API (JSON for charts)
        .route("/api/reports/monthly-trends", get(api::monthly_trends))
        .route("/api/reports/veg-split", get(api::veg_split))
        .route("/api/reports/daily-revenue", get(api::daily_revenue))
        .route("/api/reports/top-dishes", get(api::top_dishes))
        .route(
            "/api/reports/category-breakdown",
            get(api::category_breakdown),
        )
        .route("/api/dashboard/summary", get(api::dashboard_summary))
        .route("/api/categories", get(api::categories))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}

/// Navigation entries as `(href, label)`.
pub const NAV_ITEMS: &[(&str, &str)] = &[
    ("/", "🏠 Dashboard"),
    ("/menu", "🍽️ Menu"),
    ("/transactions", "💸 Transactions"),
    ("/workers", "👥 Workers"),
    ("/reports", "📊 Reports"),
];

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Fields shared by every page that extends `base.html`.
pub struct Layout {
    pub title: String,
    pub version: &'static str,
    pub xsrf_token: String,
    pub active: &'static str,
    pub can_sign_out: bool,
    pub notice: Option<Notice>,
}

impl Layout {
    pub fn new(
        state: &AppState,
        title: &str,
        active: &'static str,
        notice: Option<Notice>,
    ) -> Self {
        Self {
            title: title.to_string(),
            version: VERSION,
            xsrf_token: state.xsrf_token.value(),
            active,
            can_sign_out: matches!(state.config.auth_mode, AuthMode::Password(_)),
            notice,
        }
    }

    pub fn nav(&self) -> Vec<NavLink> {
        NAV_ITEMS
            .iter()
            .map(|&(href, label)| NavLink {
                href,
                label,
                active: href == self.active,
            })
            .collect()
    }

    pub fn has_notice(&self) -> bool {
        self.notice.is_some()
    }

    pub fn notice_text(&self) -> &str {
        self.notice.as_ref().map(|n| n.message.as_str()).unwrap_or("")
    }

    pub fn notice_class(&self) -> &'static str {
        match &self.notice {
            Some(notice) if notice.is_error() => "notice notice-error",
            _ => "notice notice-success",
        }
    }
}
