//! Per-attempt cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline shared by every network call
/// of one connection attempt.
///
/// Cloning shares the same token; use [`child`](Self::child) to derive a
/// context that can be cancelled independently of its parent.
#[derive(Clone, Debug, Default)]
pub struct ConnectContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

/// Why [`ConnectContext::run`] gave up on a future.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("context canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl ConnectContext {
    /// A context that never expires and is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Drive this context from an existing token (e.g. a shutdown token).
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set an absolute deadline.  An earlier existing deadline is kept.
    pub fn deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < at => existing,
            _ => at,
        });
        self
    }

    /// A context cancelled with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Whether the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Run `fut` until it completes, the context is cancelled, or the
    /// deadline passes.  The future is dropped on interruption.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = deadline => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}
