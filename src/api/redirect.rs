use std::sync::atomic::{AtomicUsize, Ordering};

/// Where the API Client sends the user when the session is no longer valid.
pub trait AuthRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Counts redirects instead of navigating. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    count: AtomicUsize,
}

impl RecordingRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn redirected(&self) -> bool {
        self.count() > 0
    }
}

impl AuthRedirect for RecordingRedirect {
    fn redirect_to_login(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
