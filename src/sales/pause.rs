//! Waiting out a rate-limit window.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

/// Suspends the fetch loop when the remaining quota runs low.
///
/// The default [`TokioPause`] sleeps on the tokio timer. Tests substitute an implementation that
/// records the requested durations and returns immediately.
#[async_trait]
pub trait Pause: Debug + Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps with [`tokio::time::sleep`].
#[expect(
    clippy::exhaustive_structs,
    reason = "Callers pass `TokioPause` as a value"
)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
