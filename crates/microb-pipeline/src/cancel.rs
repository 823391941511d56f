//! Cooperative cancellation for pipeline runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cloneable stop signal shared between the feeder and the workers.
///
/// A token is cancelled either explicitly via [`cancel`](Self::cancel) or
/// implicitly once its deadline passes. Checks happen between items; an item
/// that already started runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Token that is only cancelled explicitly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also cancels itself `limit` from now.
    #[must_use]
    pub fn with_timeout(limit: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(limit),
        }
    }

    /// Request cancellation. Visible to every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether work should stop.
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.cancel();
            return true;
        }
        false
    }
}
