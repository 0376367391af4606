use serde::{Deserialize, Serialize};
use std::any::Any;
use std::task::Poll;

use crate::instruction::{Value, YieldInstruction};
use crate::stop::StopToken;
use crate::task::TaskError;

/// Identifier handed out by [`Scheduler::spawn`]. Increases with registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoroutineId(u64);

impl std::fmt::Display for CoroutineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "co#{}", self.0)
    }
}

/// Why a coroutine is being resumed.
#[derive(Debug)]
pub enum Resume {
    /// First resumption after spawn.
    Start,
    /// The coroutine asked to continue on the next frame.
    NextFrame,
    /// The awaited instruction completed.
    Ready(Value),
    /// The awaited instruction failed.
    Failed(TaskError),
}

impl Resume {
    /// The awaited value, if any; a failure comes back as `Err` so it can be
    /// re-raised with `?`.
    pub fn into_result(self) -> Result<Option<Value>, TaskError> {
        match self {
            Resume::Start | Resume::NextFrame => Ok(None),
            Resume::Ready(value) => Ok(Some(value)),
            Resume::Failed(err) => Err(err),
        }
    }

    /// The awaited value as a `T`.
    pub fn into_value<T: Any>(self) -> Result<T, CoroutineError> {
        match self {
            Resume::Ready(value) => Ok(value.downcast()?),
            Resume::Failed(err) => Err(err.into()),
            Resume::Start => Err(CoroutineError::UnexpectedResume("start")),
            Resume::NextFrame => Err(CoroutineError::UnexpectedResume("next frame")),
        }
    }
}

/// What a coroutine wants after a step.
#[derive(Debug)]
pub enum Step {
    /// Suspend until the instruction completes.
    Yield(YieldInstruction),
    /// Resume on the next tick.
    NextFrame,
    /// Finished.
    Done,
}

/// Failure local to a single coroutine.
#[derive(Debug, thiserror::Error)]
pub enum CoroutineError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("expected a task result, resumed with {0}")]
    UnexpectedResume(&'static str),
    #[error("{0}")]
    Message(String),
}

/// A resumable unit of application logic, stepped once per resumption.
///
/// `Cx` is the state the frame loop lends to coroutines while they run.
pub trait Coroutine<Cx = ()> {
    fn resume(&mut self, cx: &mut Cx, input: Resume) -> Result<Step, CoroutineError>;
}

impl<Cx, C: Coroutine<Cx> + ?Sized> Coroutine<Cx> for Box<C> {
    fn resume(&mut self, cx: &mut Cx, input: Resume) -> Result<Step, CoroutineError> {
        (**self).resume(cx, input)
    }
}

/// Coroutine built from a closure. See [`from_fn`].
pub struct FromFn<F>(F);

/// Build a coroutine from a closure that is called on every resumption.
pub fn from_fn<Cx, F>(f: F) -> FromFn<F>
where
    F: FnMut(&mut Cx, Resume) -> Result<Step, CoroutineError>,
{
    FromFn(f)
}

impl<Cx, F> Coroutine<Cx> for FromFn<F>
where
    F: FnMut(&mut Cx, Resume) -> Result<Step, CoroutineError>,
{
    fn resume(&mut self, cx: &mut Cx, input: Resume) -> Result<Step, CoroutineError> {
        (self.0)(cx, input)
    }
}

/// How a coroutine left the scheduler.
#[derive(Debug)]
pub enum ExitReason {
    Completed,
    Faulted(CoroutineError),
    Stopped,
}

#[derive(Debug)]
pub struct CoroutineExit {
    pub id: CoroutineId,
    /// Tick on which the coroutine left.
    pub frame: u64,
    pub reason: ExitReason,
}

/// Per-tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    pub resumed: usize,
    pub waiting: usize,
    pub completed: usize,
    pub faulted: usize,
    pub stopped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on live coroutines. `None` = unbounded.
    pub max_coroutines: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler is at capacity ({limit} coroutines)")]
    AtCapacity { limit: usize },
    #[error("coroutine {0} is not scheduled")]
    UnknownCoroutine(CoroutineId),
}

enum Wake {
    Start,
    NextFrame,
    Waiting(YieldInstruction),
}

struct Slot<Cx> {
    id: CoroutineId,
    coroutine: Box<dyn Coroutine<Cx>>,
    wake: Wake,
    stop: Option<StopToken>,
}

/// Single-threaded, frame-driven coroutine scheduler.
///
/// Each `tick` visits live coroutines in registration order. Coroutines that
/// are starting, asked for the next frame, or whose instruction is ready get
/// resumed; the rest stay suspended. Failures stay local to the coroutine
/// that produced or awaited them.
pub struct Scheduler<Cx = ()> {
    config: SchedulerConfig,
    slots: Vec<Slot<Cx>>,
    next_id: u64,
    frame: u64,
    exits: Vec<CoroutineExit>,
}

impl<Cx> Default for Scheduler<Cx> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<Cx> Scheduler<Cx> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            next_id: 0,
            frame: 0,
            exits: Vec::new(),
        }
    }

    /// Number of live coroutines.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_idle(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of ticks run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn contains(&self, id: CoroutineId) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }

    /// Register a coroutine. It first runs on the next `tick`.
    pub fn spawn<C>(&mut self, coroutine: C) -> Result<CoroutineId, SchedulerError>
    where
        C: Coroutine<Cx> + 'static,
    {
        self.insert(Box::new(coroutine), None)
    }

    /// Register a coroutine that is retired as soon as `token` is stopped.
    pub fn spawn_with_stop<C>(
        &mut self,
        coroutine: C,
        token: StopToken,
    ) -> Result<CoroutineId, SchedulerError>
    where
        C: Coroutine<Cx> + 'static,
    {
        self.insert(Box::new(coroutine), Some(token))
    }

    fn insert(
        &mut self,
        coroutine: Box<dyn Coroutine<Cx>>,
        stop: Option<StopToken>,
    ) -> Result<CoroutineId, SchedulerError> {
        if let Some(limit) = self.config.max_coroutines {
            if self.slots.len() >= limit {
                return Err(SchedulerError::AtCapacity { limit });
            }
        }
        let id = CoroutineId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot {
            id,
            coroutine,
            wake: Wake::Start,
            stop,
        });
        tracing::debug!(%id, "coroutine spawned");
        Ok(id)
    }

    /// Retire a coroutine without resuming it again.
    pub fn stop(&mut self, id: CoroutineId) -> Result<(), SchedulerError> {
        let index = self
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or(SchedulerError::UnknownCoroutine(id))?;
        self.slots.remove(index);
        self.retire(id, ExitReason::Stopped);
        Ok(())
    }

    /// Drain and return the exit records since the last drain.
    pub fn drain_exits(&mut self) -> Vec<CoroutineExit> {
        std::mem::take(&mut self.exits)
    }

    /// Run one frame's worth of coroutine steps.
    pub fn tick(&mut self, cx: &mut Cx) -> TickReport {
        let _span = tracing::info_span!("scheduler_tick", frame = self.frame).entered();
        let mut report = TickReport {
            frame: self.frame,
            ..TickReport::default()
        };

        let slots = std::mem::take(&mut self.slots);
        let mut kept = Vec::with_capacity(slots.len());

        for mut slot in slots {
            if slot.stop.as_ref().is_some_and(StopToken::is_stop_requested) {
                report.stopped += 1;
                self.retire(slot.id, ExitReason::Stopped);
                continue;
            }

            let input = match &mut slot.wake {
                Wake::Start => Some(Resume::Start),
                Wake::NextFrame => Some(Resume::NextFrame),
                Wake::Waiting(instruction) => match instruction.poll() {
                    Poll::Pending => None,
                    Poll::Ready(Ok(value)) => Some(Resume::Ready(value)),
                    Poll::Ready(Err(err)) => Some(Resume::Failed(err)),
                },
            };
            let Some(input) = input else {
                report.waiting += 1;
                kept.push(slot);
                continue;
            };

            report.resumed += 1;
            match slot.coroutine.resume(cx, input) {
                Ok(Step::Yield(instruction)) => {
                    slot.wake = Wake::Waiting(instruction);
                    kept.push(slot);
                }
                Ok(Step::NextFrame) => {
                    slot.wake = Wake::NextFrame;
                    kept.push(slot);
                }
                Ok(Step::Done) => {
                    report.completed += 1;
                    self.retire(slot.id, ExitReason::Completed);
                }
                Err(err) => {
                    tracing::warn!(id = %slot.id, error = %err, "coroutine faulted");
                    report.faulted += 1;
                    self.retire(slot.id, ExitReason::Faulted(err));
                }
            }
        }

        self.slots = kept;
        self.frame += 1;

        tracing::trace!(
            resumed = report.resumed,
            waiting = report.waiting,
            live = self.slots.len(),
            "scheduler tick complete"
        );
        report
    }

    fn retire(&mut self, id: CoroutineId, reason: ExitReason) {
        tracing::debug!(%id, ?reason, "coroutine exited");
        self.exits.push(CoroutineExit {
            id,
            frame: self.frame,
            reason,
        });
    }
}
