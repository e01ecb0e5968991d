//! User-visible notices (toast-style).
//!
//! Auth failures are reported with a generic description. Write failures
//! (messages, profile) are always reported; nothing a user did is allowed to
//! fail silently.

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.into(), description: description.into() }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.into(), description: description.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Where notices go. The presentation layer implements this.
pub trait NoticeSink: Send + Sync {
    fn push(&self, notice: Notice);
}

/// Buffering sink: keeps notices until the view drains them.
#[derive(Default)]
pub struct NoticeLog {
    inner: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl NoticeSink for NoticeLog {
    fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(title = %notice.title, "notice"),
            NoticeLevel::Error => tracing::warn!(title = %notice.title, desc = %notice.description, "error notice"),
        }
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
