//! Cooperative coroutines driven one step per frame.
//!
//! Application code suspends by yielding a [`YieldInstruction`]; the
//! [`Scheduler`] polls it without blocking on each later tick and resumes the
//! coroutine with the result once it is ready. The work behind an instruction
//! may run on other threads; the completion handoff goes through a
//! thread-safe one-shot cell.
//!
//! # Invariants
//! - Coroutines run only inside `Scheduler::tick`, one at a time, in
//!   registration order.
//! - A coroutine that yielded during tick N is not polled before tick N+1.
//! - A failed instruction is reported only to the coroutine awaiting it, once.
//! - Stop tokens are advisory: they take effect only where they are polled.

mod instruction;
mod scheduler;
mod stop;
mod task;

pub use instruction::{InstructionState, Value, YieldInstruction};
pub use scheduler::{
    from_fn, Coroutine, CoroutineError, CoroutineExit, CoroutineId, ExitReason, FromFn, Resume,
    Scheduler, SchedulerConfig, SchedulerError, Step, TickReport,
};
pub use stop::{StopToken, StopTokenSource};
pub use task::{AsyncHandle, Completer, TaskError};

pub fn crate_info() -> &'static str {
    "stagehand-coroutine v0.1.0"
}
