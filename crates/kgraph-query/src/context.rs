//! Per-call cancellation and deadline handling.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{QueryError, Result};

/// Carries the caller's cancellation signal and optional deadline into a query.
///
/// Cloning shares the underlying token. `QueryContext::default()` never
/// cancels and has no deadline.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    token: CancellationToken,
    deadline: Option<Deadline>,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, e.g. one tripped by a signal handler.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Fail the query once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Deadline {
            at: Instant::now() + timeout,
            timeout,
        });
        self
    }

    /// Apply `timeout` only if no deadline was set by the caller.
    pub(crate) fn or_timeout(self, timeout: Option<Duration>) -> Self {
        match (self.deadline, timeout) {
            (None, Some(t)) => self.with_timeout(t),
            _ => self,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Checkpoint between units of work.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline.at {
                return Err(deadline_error(deadline));
            }
        }
        Ok(())
    }

    /// Run a store round-trip, abandoning it if the query is cancelled or
    /// its deadline passes first.
    pub(crate) async fn guard<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let cancellable = async {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(QueryError::Cancelled),
                res = fut => res,
            }
        };

        match self.deadline {
            Some(deadline) => {
                let remaining = deadline.at.saturating_duration_since(Instant::now());
                tokio::time::timeout(remaining, cancellable)
                    .await
                    .unwrap_or_else(|_| Err(deadline_error(deadline)))
            }
            None => cancellable.await,
        }
    }
}

fn deadline_error(deadline: Deadline) -> QueryError {
    QueryError::DeadlineExceeded {
        timeout_ms: u64::try_from(deadline.timeout.as_millis()).unwrap_or(u64::MAX),
    }
}
