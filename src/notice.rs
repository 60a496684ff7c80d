//! Flash-style notices carried across redirects in the query string.

use axum::response::Redirect;
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        }
    }
}

/// A short message shown once at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Query parameters that carry a notice into a page handler.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeParams {
    pub notice: Option<String>,
    pub level: Option<NoticeLevel>,
}

impl NoticeParams {
    pub fn into_notice(self) -> Option<Notice> {
        let message = self.notice.filter(|m| !m.trim().is_empty())?;
        Some(Notice {
            level: self.level.unwrap_or(NoticeLevel::Success),
            message,
        })
    }
}

/// Redirect to `path`, attaching the notice to the query string.
pub fn redirect_with(path: &str, notice: Notice) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{}{}notice={}&level={}",
        path,
        separator,
        urlencoding::encode(&notice.message),
        notice.level.as_str()
    ))
}

/// Redirect back after a failed mutation.
///
/// Validation and lookup failures are shown verbatim; anything else is
/// logged and replaced with `fallback`.
pub fn failure_redirect(err: AppError, back: &str, fallback: &str) -> Redirect {
    let message = match &err {
        AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
        _ => {
            tracing::error!(error = %err, "Mutation failed");
            fallback.to_string()
        }
    };
    redirect_with(back, Notice::error(message))
}
