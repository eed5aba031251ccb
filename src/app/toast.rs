use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

pub const TOAST_TTL: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Notification queue with auto-dismiss
#[derive(Debug, Clone)]
pub struct Toasts {
    ttl: Duration,
    queue: VecDeque<Toast>,
}

impl Default for Toasts {
    fn default() -> Self {
        Toasts::new(TOAST_TTL)
    }
}

impl Toasts {
    pub fn new(ttl: Duration) -> Self {
        Toasts {
            ttl,
            queue: VecDeque::new(),
        }
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Success, message.into(), now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.push(ToastKind::Error, message.into(), now);
    }

    fn push(&mut self, kind: ToastKind, message: String, now: Instant) {
        match kind {
            ToastKind::Success => tracing::info!(%message, "notify"),
            ToastKind::Error => tracing::warn!(%message, "notify"),
        }
        self.queue.push_back(Toast {
            kind,
            message,
            expires_at: now + self.ttl,
        });
    }

    /// Toasts still on screen at `now`; expired ones are dismissed.
    pub fn visible(&mut self, now: Instant) -> impl Iterator<Item = &Toast> {
        self.queue.retain(|t| t.expires_at > now);
        self.queue.iter()
    }

    /// Remove and return everything queued, expired or not.
    pub fn drain(&mut self) -> Vec<Toast> {
        self.queue.drain(..).collect()
    }

    pub fn last(&self) -> Option<&Toast> {
        self.queue.back()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
