//! Per-request cancellation and deadline.
//!
//! Every workflow step that waits on the network runs through `guard`, which
//! aborts as soon as the token fires or the deadline passes. Writes are not
//! raced: callers `check` right before issuing them so a write is never started
//! after cancellation was observed, and a write already in flight completes.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::GenerationError;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fails if the request was cancelled or ran past its deadline.
    pub fn check(&self) -> Result<(), GenerationError> {
        if self.token.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(GenerationError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `fut` unless the request is already dead, and abandons it the moment
    /// the request is cancelled or times out.
    pub async fn guard<F, T, E>(&self, fut: F) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<GenerationError>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(GenerationError::Cancelled),
            _ = deadline => Err(GenerationError::DeadlineExceeded),
            result = fut => result.map_err(Into::into),
        }
    }
}
