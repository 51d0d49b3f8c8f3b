//! Open push-channel counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts open push channels for `/health`.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    open: AtomicUsize,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. It stays counted until the guard drops.
    pub fn open(self: &Arc<Self>) -> ConnectionGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// Keeps one connection counted while alive.
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.open.fetch_sub(1, Ordering::SeqCst);
    }
}
