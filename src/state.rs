use crate::auth::SessionStore;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::xsrf::XsrfToken;
use rusqlite::Connection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub xsrf_token: XsrfToken,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let sessions = SessionStore::new(config.session_ttl_hours);
        Self {
            db,
            config: Arc::new(config),
            xsrf_token: XsrfToken::generate(),
            sessions,
        }
    }

    /// Run a blocking read against its own pooled connection.
    ///
    /// Independent reads can be awaited together with `tokio::try_join!`.
    pub async fn read<T, F>(&self, query: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> AppResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get()?;
            query(&conn)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Read task failed: {}", e)))?
    }

    pub fn format_money(&self, cents: i64) -> String {
        crate::filters::format_money(cents, &self.config.currency, &self.config.locale)
    }

    pub fn format_money_colored(&self, cents: i64) -> String {
        crate::filters::format_money_colored(cents, &self.config.currency, &self.config.locale)
    }
}
