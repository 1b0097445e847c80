//! Drives one prompt from submission to a finished image, retrying transient failures.

use crate::{
    client::{GenerationBackend, ImageClient},
    config::{Config, RetryPolicy},
    error::{GenerationError, Result},
    models::{Banner, GenerationRequest, ImageReference, Quality, SessionState},
    scheduler::{ScheduledTask, TaskScheduler},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

pub struct RequestCoordinator {
    backend: Arc<dyn GenerationBackend>,
    policy: RetryPolicy,
    success_notice: Duration,
    state: Arc<watch::Sender<SessionState>>,
    retries: TaskScheduler,
    notices: TaskScheduler,
    success_timer: Mutex<Option<ScheduledTask<()>>>,
    cancel_requested: AtomicBool,
}

impl RequestCoordinator {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: &Config) -> Self {
        let (state, _) = watch::channel(SessionState::new(config.retry.max_retries));
        Self {
            backend,
            policy: config.retry,
            success_notice: config.success_notice,
            state: Arc::new(state),
            retries: TaskScheduler::new(),
            notices: TaskScheduler::new(),
            success_timer: Mutex::new(None),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Coordinator backed by an [`ImageClient`] for `config.api_url`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ImageClient::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Stream of session snapshots, starting with the current one.
    pub fn updates(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.subscribe())
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Fresh submission: resets attempt state, then runs the whole retry chain.
    pub async fn generate(&self, prompt: &str, quality: Quality) -> Result<ImageReference> {
        self.submit(prompt, quality, false).await
    }

    /// Submits `prompt` and resolves once the chain succeeds or fails for good.
    ///
    /// With `is_retry_attempt` set, loading state and the retry counter are left
    /// as they are, so the call continues an existing sequence instead of starting one.
    pub async fn submit(
        &self,
        prompt: &str,
        quality: Quality,
        is_retry_attempt: bool,
    ) -> Result<ImageReference> {
        let request = match GenerationRequest::new(prompt, quality) {
            Ok(request) => request,
            Err(err) => {
                log::warn!("Rejected submission: {}", err);
                self.state
                    .send_modify(|s| s.banner = Some(Banner::error(err.to_string())));
                return Err(err);
            }
        };

        let _loading = if is_retry_attempt {
            self.cancel_requested.store(false, Ordering::SeqCst);
            None
        } else {
            self.begin(quality)?;
            Some(StateGuard::new(self.state.clone(), |s| s.loading = false))
        };

        let id = Uuid::new_v4().simple().to_string();
        let chain_id = &id[..8];
        log::info!(
            "[{}] Starting {} submission",
            chain_id,
            if is_retry_attempt { "retry" } else { "fresh" }
        );

        self.run_chain(chain_id, request).await
    }

    /// Cancels a pending automatic retry and stops the current chain from scheduling more.
    ///
    /// If an attempt is already on the wire its reply is still awaited; a successful
    /// reply is kept, any failure ends the chain as [`GenerationError::Cancelled`].
    /// The next call to [`submit`](Self::submit) starts with the cancellation cleared.
    pub fn cancel(&self) {
        log::info!("Cancelling pending retries");
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.retries.cancel_all();
    }

    fn begin(&self, quality: Quality) -> Result<()> {
        let mut busy = false;
        self.state.send_if_modified(|s| {
            if s.loading {
                busy = true;
                false
            } else {
                s.begin(quality);
                true
            }
        });
        if busy {
            log::warn!("Submission ignored, a request is already in progress");
            return Err(GenerationError::Busy);
        }

        self.cancel_requested.store(false, Ordering::SeqCst);
        if let Some(timer) = self.lock_success_timer().take() {
            timer.cancel();
        }
        Ok(())
    }

    async fn run_chain(&self, chain_id: &str, request: GenerationRequest) -> Result<ImageReference> {
        let mut outcome = attempt(self.backend.clone(), self.state.clone(), request.clone()).await;

        loop {
            let err = match outcome {
                Ok(image) => {
                    log::info!("[{}] Image generated successfully", chain_id);
                    self.succeed(image.clone());
                    return Ok(image);
                }
                Err(err) => err,
            };

            let cancelled = self.cancel_requested.load(Ordering::SeqCst);
            let err = if cancelled {
                GenerationError::Cancelled
            } else {
                err
            };

            let retry_count = self.state.borrow().retry_count;
            let can_retry = err.is_retryable()
                && retry_count < self.policy.max_retries;

            if !can_retry {
                log::error!(
                    "[{}] Giving up after {} retries ({}): {}",
                    chain_id,
                    retry_count,
                    err.kind(),
                    err
                );
                if let Some(detail) = err.detail() {
                    log::debug!("[{}] {}", chain_id, detail);
                }
                self.state
                    .send_modify(|s| s.banner = Some(Banner::error(err.to_string())));
                return Err(err);
            }

            let next = retry_count + 1;
            let max_retries = self.policy.max_retries;
            self.state.send_modify(|s| {
                s.retry_count = next;
                s.banner = Some(Banner::retrying(next, max_retries));
            });
            log::warn!(
                "[{}] {} - retrying in {:?} (attempt {}/{})",
                chain_id,
                err,
                self.policy.delay,
                next,
                max_retries
            );

            let task = self.retries.schedule(
                self.policy.delay,
                attempt(self.backend.clone(), self.state.clone(), request.clone()),
            );
            if self.cancel_requested.load(Ordering::SeqCst) {
                task.cancel();
            }

            outcome = match task.join().await {
                Some(result) => result,
                None => {
                    log::info!("[{}] Retry cancelled", chain_id);
                    Err(GenerationError::Cancelled)
                }
            };
        }
    }

    fn succeed(&self, image: ImageReference) {
        self.state.send_modify(|s| {
            s.image = Some(image);
            s.banner = None;
            s.show_success = true;
        });

        let state = self.state.clone();
        let timer = self.notices.schedule(self.success_notice, async move {
            state.send_modify(|s| s.show_success = false);
        });
        if let Some(previous) = self.lock_success_timer().replace(timer) {
            previous.cancel();
        }
    }

    fn lock_success_timer(&self) -> std::sync::MutexGuard<'_, Option<ScheduledTask<()>>> {
        self.success_timer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One network attempt with the in-flight flag raised around it.
async fn attempt(
    backend: Arc<dyn GenerationBackend>,
    state: Arc<watch::Sender<SessionState>>,
    request: GenerationRequest,
) -> Result<ImageReference> {
    state.send_modify(|s| s.in_flight = true);
    let _in_flight = StateGuard::new(state, |s| s.in_flight = false);
    backend.generate(&request).await
}

/// Applies a state change when dropped, so an abandoned future still leaves the
/// session consistent.
struct StateGuard {
    state: Arc<watch::Sender<SessionState>>,
    on_drop: fn(&mut SessionState),
}

impl StateGuard {
    fn new(state: Arc<watch::Sender<SessionState>>, on_drop: fn(&mut SessionState)) -> Self {
        Self { state, on_drop }
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        self.state.send_modify(self.on_drop);
    }
}
