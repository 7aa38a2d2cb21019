//! Cancelable deferred tasks.
//!
//! `schedule` arms a one-shot timer and returns an opaque [`TaskHandle`].
//! Revocation is best-effort: cancelling a handle whose task already fired
//! is a no-op, so callers always cancel on cleanup without checking. Fired
//! callbacks are expected to re-read current state before acting — the
//! session may have changed between scheduling and firing.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Handle to a scheduled task. Dropping the handle does NOT cancel the task;
/// revocation is always explicit.
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
}

impl TaskHandle {
    /// Best-effort cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Run `task` after `delay` unless the returned handle is cancelled first.
pub fn schedule<F>(delay: Duration, task: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let armed = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = armed.cancelled() => {}
            _ = tokio::time::sleep(delay) => task.await,
        }
    });
    TaskHandle { token }
}
