//! Cooperative cancellation for in-flight executions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clonable flag checked between slice iterations. Cancelling aborts the run
/// with [`SliceError::Cancelled`](crate::SliceError::Cancelled); no partial
/// output is ever returned.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
