//! Progress reporting for long fetches.
//!
//! The fetch loop never prints anything itself; it calls a [`Progress`] implementation passed
//! in by the caller, which may drive a progress bar, log, or do nothing.

/// Receives progress updates from a multi-step fetch.
///
/// `total` is an estimate: for paginated fetches it is derived from `page_info.total_results`
/// once the first page has arrived.
pub trait Progress: Send + Sync {
    /// Called once, when the number of steps becomes known.
    fn start(&self, _total: Option<u64>) {}

    /// Called after each completed step with the number of steps done so far.
    fn advance(&self, _completed: u64) {}

    /// Called once when the fetch stops, successfully or not.
    fn finish(&self) {}
}

/// Ignores every update.
#[expect(
    clippy::exhaustive_structs,
    reason = "Callers pass `&NoProgress` as a value"
)]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Logs every update as a `tracing` event at `INFO` level.
#[cfg(feature = "tracing")]
#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub struct TracingProgress {
    pub label: &'static str,
}

#[cfg(feature = "tracing")]
impl TracingProgress {
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

#[cfg(feature = "tracing")]
impl Progress for TracingProgress {
    fn start(&self, total: Option<u64>) {
        tracing::info!(label = self.label, total = ?total, "started");
    }

    fn advance(&self, completed: u64) {
        tracing::info!(label = self.label, completed, "progress");
    }

    fn finish(&self) {
        tracing::info!(label = self.label, "finished");
    }
}

impl<P: Progress + ?Sized> Progress for &P {
    fn start(&self, total: Option<u64>) {
        (**self).start(total);
    }

    fn advance(&self, completed: u64) {
        (**self).advance(completed);
    }

    fn finish(&self) {
        (**self).finish();
    }
}
