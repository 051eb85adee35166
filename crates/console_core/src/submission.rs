use std::{
    fmt::Display,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::domain::Validate;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{FormError, InvalidState};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(String),
    Failed(FormError),
}

impl SubmissionState {
    fn admit(&self) -> Result<(), InvalidState> {
        match self {
            SubmissionState::Idle | SubmissionState::Failed(_) => Ok(()),
            SubmissionState::Submitting => Err(InvalidState::AlreadySubmitting),
            SubmissionState::Succeeded(_) => Err(InvalidState::AwaitingSettle),
        }
    }
}

struct SubmissionInner {
    state: SubmissionState,
    // Bumped on reset/dispose; late results and settle tasks compare against it.
    generation: u64,
    settle_task: Option<JoinHandle<()>>,
    disposed: bool,
}

impl SubmissionInner {
    fn admit(&self) -> Result<(), InvalidState> {
        if self.disposed {
            return Err(InvalidState::Disposed);
        }
        self.state.admit()
    }

    // An operation still running keeps `Submitting` until it returns; its result
    // is then dropped by the generation check.
    fn invalidate(&mut self) {
        self.generation += 1;
        if let Some(task) = self.settle_task.take() {
            task.abort();
        }
        if self.state != SubmissionState::Submitting {
            self.state = SubmissionState::Idle;
        }
    }
}

fn lock(inner: &Mutex<SubmissionInner>) -> MutexGuard<'_, SubmissionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SubmissionController {
    inner: Arc<Mutex<SubmissionInner>>,
    settle_delay: Duration,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::with_settle_delay(DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(settle_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubmissionInner {
                state: SubmissionState::Idle,
                generation: 0,
                settle_task: None,
                disposed: false,
            })),
            settle_delay,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.inner).state.clone()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(lock(&self.inner).state, SubmissionState::Submitting)
    }

    pub fn message(&self) -> Option<String> {
        match &lock(&self.inner).state {
            SubmissionState::Succeeded(message) => Some(message.clone()),
            SubmissionState::Failed(err) => Some(err.to_string()),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }

    pub async fn submit<F, Fut, E, S>(
        &self,
        operation: F,
        on_settled: S,
    ) -> Result<SubmissionState, InvalidState>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
        S: FnOnce() + Send + 'static,
    {
        let generation = self.begin()?;
        let outcome = operation().await.map_err(FormError::operation);
        Ok(self.finish(generation, outcome, on_settled))
    }

    pub async fn submit_validated<V, F, Fut, E, S>(
        &self,
        fields: V,
        operation: F,
        on_settled: S,
    ) -> Result<SubmissionState, InvalidState>
    where
        V: Validate,
        F: FnOnce(V) -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
        S: FnOnce() + Send + 'static,
    {
        if let Err(err) = fields.validate() {
            let mut inner = lock(&self.inner);
            if let Err(violation) = inner.admit() {
                debug!(%violation, "submission: ignoring submit");
                return Err(violation);
            }
            debug!(%err, "submission: rejected invalid input");
            inner.state = SubmissionState::Failed(FormError::Validation(err));
            return Ok(inner.state.clone());
        }
        self.submit(move || operation(fields), on_settled).await
    }

    /// Back to `Idle`; an operation already in flight still blocks new submits until it returns.
    pub fn reset(&self) {
        lock(&self.inner).invalidate();
    }

    pub fn dispose(&self) {
        let mut inner = lock(&self.inner);
        inner.invalidate();
        inner.disposed = true;
    }

    fn begin(&self) -> Result<u64, InvalidState> {
        let mut inner = lock(&self.inner);
        if let Err(violation) = inner.admit() {
            debug!(%violation, "submission: ignoring submit");
            return Err(violation);
        }
        inner.state = SubmissionState::Submitting;
        debug!("submission: submitting");
        Ok(inner.generation)
    }

    fn finish<S>(
        &self,
        generation: u64,
        outcome: Result<String, FormError>,
        on_settled: S,
    ) -> SubmissionState
    where
        S: FnOnce() + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            debug!("submission: dropping result of a discarded submission");
            inner.state = SubmissionState::Idle;
            return SubmissionState::Idle;
        }

        match outcome {
            Ok(message) => {
                debug!(%message, "submission: succeeded");
                inner.state = SubmissionState::Succeeded(message);
                inner.settle_task = Some(self.schedule_settle(generation, on_settled));
            }
            Err(err) => {
                warn!(%err, "submission: failed");
                inner.state = SubmissionState::Failed(err);
            }
        }
        inner.state.clone()
    }

    fn schedule_settle<S>(&self, generation: u64, on_settled: S) -> JoinHandle<()>
    where
        S: FnOnce() + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let delay = self.settle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut guard = lock(&inner);
                if guard.generation != generation {
                    return;
                }
                guard.state = SubmissionState::Idle;
                guard.settle_task = None;
            }
            debug!("submission: settled");
            on_settled();
        })
    }
}

impl Drop for SubmissionController {
    fn drop(&mut self) {
        lock(&self.inner).invalidate();
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
