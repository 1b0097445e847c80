//! Deferred tasks that can be cancelled before they fire.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Hands out delayed tasks that share a cancellable parent token.
#[derive(Debug, Default)]
pub struct TaskScheduler {
    root: Mutex<CancellationToken>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless the returned handle (or the scheduler) is cancelled first.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, T>(&self, delay: Duration, task: F) -> ScheduledTask<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let token = self.root_token().child_token();
        let guard = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => None,
                _ = tokio::time::sleep(delay) => {
                    if guard.is_cancelled() {
                        None
                    } else {
                        Some(task.await)
                    }
                }
            }
        });

        ScheduledTask {
            token,
            handle: Some(handle),
        }
    }

    /// Cancel every task scheduled so far. Later calls to `schedule` are unaffected.
    pub fn cancel_all(&self) {
        let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        root.cancel();
        *root = CancellationToken::new();
    }

    fn root_token(&self) -> CancellationToken {
        self.root.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Handle to a task created by [`TaskScheduler::schedule`].
///
/// Dropping the handle cancels the task, and aborts it if it is already running.
#[derive(Debug)]
pub struct ScheduledTask<T> {
    token: CancellationToken,
    handle: Option<JoinHandle<Option<T>>>,
}

impl<T> ScheduledTask<T> {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the task. `None` means it was cancelled before it ran.
    pub async fn join(mut self) -> Option<T> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(output) => output,
            Err(e) => {
                log::error!("Scheduled task failed: {}", e);
                None
            }
        }
    }
}

impl<T> Drop for ScheduledTask<T> {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
