use futures::channel::oneshot;
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Failure of an awaited operation, as seen by the coroutine that awaited it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),
    /// The producer went away (dropped or panicked) without completing.
    #[error("task ended without producing a result")]
    Abandoned,
    #[error("task result is not a {expected}")]
    TypeMismatch { expected: &'static str },
    /// The instruction already handed out its outcome.
    #[error("outcome already consumed")]
    Consumed,
}

type Outcome<T> = Result<T, TaskError>;

/// Handle to an asynchronous operation producing a `T`.
///
/// Backed by a one-shot channel: exactly one writer (the [`Completer`]) and
/// one reader (this handle), safe to complete from any thread.
#[derive(Debug)]
pub struct AsyncHandle<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

/// Write side of an [`AsyncHandle`].
#[derive(Debug)]
pub struct Completer<T> {
    tx: oneshot::Sender<Outcome<T>>,
}

impl<T: Send + 'static> AsyncHandle<T> {
    /// A pending handle and the completer that resolves it.
    pub fn pair() -> (Completer<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (Completer { tx }, Self { rx })
    }

    /// An already completed handle.
    pub fn ready(value: T) -> Self {
        let (completer, handle) = Self::pair();
        completer.succeed(value);
        handle
    }

    /// An already failed handle.
    pub fn failed(reason: impl Display) -> Self {
        let (completer, handle) = Self::pair();
        completer.fail(reason);
        handle
    }

    /// Run `work` on a background thread.
    ///
    /// A panic in `work` surfaces as [`TaskError::Abandoned`].
    pub fn spawn<F, E>(work: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Display,
    {
        let (completer, handle) = Self::pair();
        let spawned = std::thread::Builder::new()
            .name("stagehand-task".into())
            .spawn(move || {
                let outcome = work().map_err(|e| TaskError::Failed(e.to_string()));
                completer.complete(outcome);
            });

        match spawned {
            Ok(_) => handle,
            Err(err) => {
                tracing::warn!(%err, "could not start task thread");
                Self::failed(err)
            }
        }
    }
}

impl<T> Completer<T> {
    pub fn complete(self, outcome: Result<T, TaskError>) {
        if self.tx.send(outcome).is_err() {
            tracing::trace!("task completed after its handle was dropped");
        }
    }

    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, reason: impl Display) {
        self.complete(Err(TaskError::Failed(reason.to_string())));
    }

    /// Whether the handle side has been dropped.
    pub fn is_canceled(&self) -> bool {
        self.tx.is_canceled()
    }
}

// Only the receiver is polled and it is never pinned in place.
impl<T> Unpin for AsyncHandle<T> {}

impl<T> Future for AsyncHandle<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.rx.poll_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(TaskError::Abandoned)),
        }
    }
}
