use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::shared::constants::TOAST_DURATION;
use crate::shared::error::ClientError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A transient, user-facing message.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

impl From<&ClientError> for Notice {
    fn from(error: &ClientError) -> Self {
        match error {
            // Validation messages are already phrased for the user.
            ClientError::Validation(message) => Notice::error(message.clone()),
            other => Notice::error(format!("Error: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub notice: Notice,
    expires_at: Instant,
}

/// Active notices, each dismissed automatically after a fixed delay.
///
/// Time is passed in explicitly so callers decide the clock (the desktop
/// app uses its subscription ticks; tests use fixed instants).
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    ttl: Duration,
    next_id: u64,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::with_ttl(TOAST_DURATION)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            ttl,
            next_id: 0,
        }
    }

    /// Adds a notice and returns its id.
    pub fn push(&mut self, notice: Notice, now: Instant) -> u64 {
        self.next_id += 1;
        self.toasts.push_back(Toast {
            id: self.next_id,
            notice,
            expires_at: now + self.ttl,
        });
        self.next_id
    }

    /// Drops every toast whose delay has elapsed. Returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at > now);
        before - self.toasts.len()
    }

    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
