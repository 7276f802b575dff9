//! Per-call cancellation and deadline

use std::future::Future;
use std::time::Duration;

use tallybridge_domain::{Result, TallyError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation handle plus optional deadline for one gateway call.
///
/// Cloning shares the cancellation token, so cancelling any clone stops
/// every call using it.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context that never expires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { token: CancellationToken::new(), deadline: Some(deadline) }
    }

    /// Wrap an existing token, e.g. a scheduler's shutdown token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Same token, tighter of the two deadlines.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = Some(self.deadline.map_or(candidate, |current| current.min(candidate)));
        Self { token: self.token.clone(), deadline }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Timeout error describing why the context ended, `None` while live.
    pub fn err(&self) -> Option<TallyError> {
        if self.is_cancelled() {
            Some(TallyError::Timeout("context cancelled".to_string()))
        } else if self.is_done() {
            Some(TallyError::Timeout("context deadline exceeded".to_string()))
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Drive `future` unless the context ends first.
    pub async fn run<T, F>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }

        tokio::select! {
            biased;
            _ = self.done() => Err(self.expired()),
            result = future => result,
        }
    }

    /// Sleep for `duration`, returning early with a timeout error if the
    /// context ends.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }

    fn expired(&self) -> TallyError {
        self.err().unwrap_or_else(|| TallyError::Timeout("context deadline exceeded".to_string()))
    }
}
