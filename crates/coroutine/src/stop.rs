use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner side of a cooperative cancellation flag.
///
/// `stop` is idempotent. Disposing the source (explicitly or by dropping it)
/// always leaves the flag set, so an abandoned operation never keeps running
/// on a live token.
#[derive(Debug, Default)]
pub struct StopTokenSource {
    flag: Arc<AtomicBool>,
}

/// Read side of a [`StopTokenSource`]. Cheap to clone, readable from any thread.
#[derive(Debug, Clone)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            tracing::trace!("stop requested");
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn token(&self) -> StopToken {
        StopToken {
            flag: Arc::clone(&self.flag),
        }
    }

    /// End the scope. Equivalent to dropping the source.
    pub fn dispose(self) {}
}

impl Drop for StopTokenSource {
    fn drop(&mut self) {
        self.stop();
    }
}

impl StopToken {
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
