//! Units of work submitted to a [`WorkerPool`](crate::worker_pool::WorkerPool).
//!
//! A [`Task`] bundles a type-erased job closure with a result slot and a state cell.
//! The submitting side keeps a [`TaskHandle`] that observes the state and blocks on
//! the result slot until the job completes.
//!
//! ## Task Lifecycle
//!
//! 1. Pending: queued, not yet picked up by a worker
//! 2. Running: a worker is executing the job
//! 3. Done: the job returned (or panicked) and its outcome is in the result slot
//!
//! A pending task removed from the queue by a pool shutdown moves to `Discarded`
//! instead. Both `Done` and `Discarded` are terminal; a task never returns to
//! `Pending`, and the job closure is `FnOnce`, so it runs at most once.
//!
//! ## Panics
//!
//! A panicking job does not take the worker thread down. The panic payload is
//! captured into the result slot and re-raised on the thread that calls
//! [`TaskHandle::join`].

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Condvar, Mutex, PoisonError,
        atomic::{AtomicU8, Ordering},
    },
    thread,
};

use kerma_common::{
    Result,
    error::{ErrorKind, InterruptReason, Interruption},
};

/// Observable execution state of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Discarded,
}

impl TaskState {
    fn from_u8(value: u8) -> TaskState {
        match value {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            2 => TaskState::Done,
            _ => TaskState::Discarded,
        }
    }

    /// Returns `true` for states that can never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Discarded)
    }
}

/// A queued unit of work: the job closure (already bound to its input and to the
/// completing half of the result slot) and the shared state cell.
pub(crate) struct Task {
    work: Box<dyn FnOnce() + Send + 'static>,
    state: Arc<AtomicU8>,
}

impl Task {
    /// Creates a task for `f` along with the handle its submitter waits on.
    pub(crate) fn new<F, R>(f: F) -> (Task, TaskHandle<R>)
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let slot = Arc::new(ResultSlot::new());
        let state = Arc::new(AtomicU8::new(TaskState::Pending as u8));

        let completer = Completer(slot.clone());
        let work_state = state.clone();
        let work = move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f));
            work_state.store(TaskState::Done as u8, Ordering::SeqCst);
            completer.complete(outcome);
        };

        let task = Task {
            work: Box::new(work),
            state: state.clone(),
        };
        (task, TaskHandle { slot, state })
    }

    /// Executes the job on the current thread and publishes its outcome.
    pub(crate) fn run(self) {
        self.state.store(TaskState::Running as u8, Ordering::SeqCst);
        (self.work)();
    }

    /// Drops the job without running it. The waiter observes a `Discarded` interruption.
    pub(crate) fn discard(self) {
        // The state must be visible before the completer is dropped and the slot closes.
        self.state.store(TaskState::Discarded as u8, Ordering::SeqCst);
        drop(self.work);
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// A handle for waiting on the result of a task submitted to a worker pool.
///
/// The handle owns the receiving half of the task's result slot. Retrieving the
/// result consumes the handle, so each result is read at most once.
pub struct TaskHandle<R> {
    slot: Arc<ResultSlot<R>>,
    state: Arc<AtomicU8>,
}

impl<R> TaskHandle<R> {
    /// Returns the current execution state of the task.
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Checks whether the outcome is available (or will never arrive) without blocking.
    pub fn is_ready(&self) -> bool {
        !self.slot.is_pending()
    }

    /// Waits for the task to complete and returns its result.
    ///
    /// # Errors
    ///
    /// Returns an `Interrupted` error if the task was discarded before it ran.
    ///
    /// # Panics
    ///
    /// Re-raises the panic of the job, if it panicked.
    pub fn join(self) -> Result<R> {
        match self.wait() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(reason) => Err(ErrorKind::Interrupted {
                primary: Interruption {
                    task_index: 0,
                    reason,
                },
                suppressed: Vec::new(),
            }
            .into()),
        }
    }

    /// Blocks until the slot resolves. `Err` carries the reason the slot was closed
    /// without an outcome.
    pub(crate) fn wait(self) -> std::result::Result<thread::Result<R>, InterruptReason> {
        match self.slot.wait() {
            Some(outcome) => Ok(outcome),
            None if self.state() == TaskState::Discarded => Err(InterruptReason::Discarded),
            None => Err(InterruptReason::Abandoned),
        }
    }
}

/// Completing half of a result slot. Dropping it without completing closes the slot.
struct Completer<R>(Arc<ResultSlot<R>>);

impl<R> Completer<R> {
    fn complete(self, outcome: thread::Result<R>) {
        self.0.set(outcome);
    }
}

impl<R> Drop for Completer<R> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Single-assignment cell with a blocking read.
struct ResultSlot<R> {
    value: Mutex<Slot<R>>,
    ready: Condvar,
}

/// `Pending -> Ready -> Taken`, or `Pending -> Taken` when closed without a value.
enum Slot<R> {
    Pending,
    Ready(thread::Result<R>),
    Taken,
}

impl<R> ResultSlot<R> {
    fn new() -> ResultSlot<R> {
        ResultSlot {
            value: Mutex::new(Slot::Pending),
            ready: Condvar::new(),
        }
    }

    fn set(&self, outcome: thread::Result<R>) {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*guard, Slot::Pending) {
            *guard = Slot::Ready(outcome);
        }
        drop(guard);
        self.ready.notify_all();
    }

    fn close(&self) {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*guard, Slot::Pending) {
            *guard = Slot::Taken;
        }
        drop(guard);
        self.ready.notify_all();
    }

    fn is_pending(&self) -> bool {
        matches!(
            *self.value.lock().unwrap_or_else(PoisonError::into_inner),
            Slot::Pending
        )
    }

    fn wait(&self) -> Option<thread::Result<R>> {
        let guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        let mut guard = self
            .ready
            .wait_while(guard, |slot| matches!(slot, Slot::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *guard, Slot::Taken) {
            Slot::Ready(outcome) => Some(outcome),
            Slot::Pending | Slot::Taken => None,
        }
    }
}
