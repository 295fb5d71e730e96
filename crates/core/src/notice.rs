//! Transient status notifications.

use std::time::{Duration, Instant};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Operation completed.
    Success,
    /// Neutral information.
    Info,
    /// Destructive or noteworthy action.
    Warning,
    /// Operation failed.
    Error,
}

/// A message shown to the user until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub text: String,
}

impl Notice {
    /// Build a notice.
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Success notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    /// Informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    /// Warning notice.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    /// Error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }
}

/// Holds at most one visible notice; a newer one replaces the old.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<(Notice, Instant)>,
}

impl NoticeBoard {
    /// Board whose notices live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Show `notice` starting now.
    pub fn post(&mut self, notice: Notice) {
        self.post_at(notice, Instant::now());
    }

    /// Show `notice` starting at `now`.
    pub fn post_at(&mut self, notice: Notice, now: Instant) {
        self.current = Some((notice, now + self.ttl));
    }

    /// Drop the notice if it has expired by `now`; returns whether it was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some((_, deadline)) if now >= *deadline => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Dismiss the visible notice.
    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Currently visible notice.
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref().map(|(notice, _)| notice)
    }
}
