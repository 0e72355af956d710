//! The FIFO queue shared between a worker pool's submitters and its workers.
//!
//! A single mutex guards both the queue contents and the stop flag, and one
//! condition variable signals "not empty or stopped". Queue membership and dequeue
//! are therefore atomic with respect to the guard, while the dequeued jobs run
//! after the guard is released.

use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

use crate::task::Task;

pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
}

struct QueueState {
    tasks: VecDeque<Task>,
    stopped: bool,
}

impl TaskQueue {
    pub(crate) fn new() -> TaskQueue {
        TaskQueue {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stopped: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Appends all `tasks` in one critical section and wakes the workers once.
    ///
    /// If the queue has been stopped, nothing is enqueued and the tasks are handed
    /// back to the caller.
    pub(crate) fn push_batch(&self, tasks: Vec<Task>) -> Result<(), Vec<Task>> {
        let mut state = self.lock();
        if state.stopped {
            return Err(tasks);
        }
        let count = tasks.len();
        state.tasks.extend(tasks);
        drop(state);

        match count {
            0 => (),
            1 => self.not_empty.notify_one(),
            _ => self.not_empty.notify_all(),
        }
        Ok(())
    }

    /// Dequeues the oldest task, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is stopped.
    pub(crate) fn pop(&self) -> Option<Task> {
        let state = self.lock();
        let mut state = self
            .not_empty
            .wait_while(state, |state| state.tasks.is_empty() && !state.stopped)
            .unwrap_or_else(PoisonError::into_inner);
        if state.stopped {
            return None;
        }
        state.tasks.pop_front()
    }

    /// Stops the queue and takes every task that has not been dequeued yet.
    ///
    /// All blocked `pop` calls wake up and return `None`. Returns `None` if the
    /// queue was already stopped.
    pub(crate) fn stop(&self) -> Option<Vec<Task>> {
        let mut state = self.lock();
        if state.stopped {
            return None;
        }
        state.stopped = true;
        let drained = state.tasks.drain(..).collect::<Vec<_>>();
        drop(state);

        self.not_empty.notify_all();
        Some(drained)
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
