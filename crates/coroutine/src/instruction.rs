use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::task::{AsyncHandle, TaskError};

/// Type-erased result of a completed instruction.
pub struct Value(Box<dyn Any + Send>);

impl Value {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Result of instructions that carry no payload (frame waits, delays).
    pub fn unit() -> Self {
        Self::new(())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, TaskError> {
        self.0
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| TaskError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            })
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Value(..)")
    }
}

/// Where an instruction is in its lifecycle. Terminal states are sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionState {
    Pending,
    Completed,
    Failed,
}

type BoxedTask = Pin<Box<dyn Future<Output = Result<Value, TaskError>> + Send>>;

enum Wait {
    Task(BoxedTask),
    Frames(u32),
    Until(Instant),
    /// Outcome has been handed out.
    Done,
}

/// A unit of awaitable work a coroutine suspends on.
///
/// Created once per await point and consumed by the scheduler: polled until it
/// reports an outcome, which is handed out exactly once.
pub struct YieldInstruction {
    wait: Wait,
    state: InstructionState,
}

impl YieldInstruction {
    fn pending(wait: Wait) -> Self {
        Self {
            wait,
            state: InstructionState::Pending,
        }
    }

    /// Suspend until `handle` completes.
    pub fn task<T: Send + 'static>(handle: AsyncHandle<T>) -> Self {
        Self::from_future(handle)
    }

    /// Suspend until an arbitrary future resolves.
    ///
    /// The future is polled on the scheduler's thread. A panic while polling
    /// resolves the instruction as [`TaskError::Abandoned`].
    pub fn from_future<F, T>(future: F) -> Self
    where
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
    {
        let guarded = AssertUnwindSafe(future).catch_unwind().map(|caught| match caught {
            Ok(outcome) => outcome.map(Value::new),
            Err(_) => {
                tracing::warn!("awaited future panicked");
                Err(TaskError::Abandoned)
            }
        });
        Self::pending(Wait::Task(Box::pin(guarded)))
    }

    /// Complete on the `n`th poll. `frames(0)` and `frames(1)` both complete on
    /// the first poll.
    pub fn frames(n: u32) -> Self {
        Self::pending(Wait::Frames(n))
    }

    /// Complete on the first poll at or after `duration` from now.
    pub fn delay(duration: Duration) -> Self {
        Self::pending(Wait::Until(Instant::now() + duration))
    }

    pub fn state(&self) -> InstructionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state != InstructionState::Pending
    }

    /// Check for completion without blocking.
    ///
    /// Returns the outcome the first time it is ready; any later call returns
    /// `TaskError::Consumed`.
    pub fn poll(&mut self) -> Poll<Result<Value, TaskError>> {
        let outcome = match &mut self.wait {
            Wait::Done => return Poll::Ready(Err(TaskError::Consumed)),
            Wait::Task(future) => {
                let mut cx = Context::from_waker(noop_waker_ref());
                match future.as_mut().poll(&mut cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(outcome) => outcome,
                }
            }
            Wait::Frames(remaining) => {
                if *remaining > 1 {
                    *remaining -= 1;
                    return Poll::Pending;
                }
                Ok(Value::unit())
            }
            Wait::Until(deadline) => {
                if Instant::now() < *deadline {
                    return Poll::Pending;
                }
                Ok(Value::unit())
            }
        };

        self.wait = Wait::Done;
        self.state = match outcome {
            Ok(_) => InstructionState::Completed,
            Err(_) => InstructionState::Failed,
        };
        Poll::Ready(outcome)
    }
}

impl<T: Send + 'static> From<AsyncHandle<T>> for YieldInstruction {
    fn from(handle: AsyncHandle<T>) -> Self {
        Self::task(handle)
    }
}

impl std::fmt::Debug for YieldInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wait = match &self.wait {
            Wait::Task(_) => "task".to_string(),
            Wait::Frames(n) => format!("frames({n})"),
            Wait::Until(deadline) => format!("until({deadline:?})"),
            Wait::Done => "done".to_string(),
        };
        f.debug_struct("YieldInstruction")
            .field("wait", &wait)
            .field("state", &self.state)
            .finish()
    }
}
