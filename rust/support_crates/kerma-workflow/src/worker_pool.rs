//! Fixed-size worker pool with ordered batch mapping.
//!
//! [`WorkerPool`] owns a FIFO [`TaskQueue`] and a fixed set of worker threads. Each
//! worker repeatedly takes one task off the queue (under the queue guard), releases
//! the guard and executes the task, so job bodies run concurrently with each other
//! and only queue mutation is serialized.
//!
//! [`WorkerPool::map`] submits one task per input and collects the results in input
//! order, independently of the order in which the tasks complete.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use kerma_common::{
    Result,
    error::{Error, Interruption},
    verify_arg,
};

use crate::{
    task::{Task, TaskHandle},
    task_queue::TaskQueue,
};

/// A fixed-size pool of worker threads executing submitted tasks.
///
/// ## Shutdown
///
/// [`shutdown`](Self::shutdown) stops the queue, discards every task that has not
/// been picked up yet and wakes idle workers, which then exit. A worker that is in
/// the middle of a job finishes it and exits on its next loop iteration. Callers
/// blocked in [`map`](Self::map) on discarded tasks receive an `Interrupted` error.
/// Submitting work after shutdown is rejected with an `InvalidOperation` error.
///
/// Dropping the pool shuts it down without waiting for the workers; use
/// [`join`](Self::join) to wait for them.
///
/// ## Thread Safety
///
/// All methods take `&self` and can be called concurrently from multiple threads.
/// Share the pool between owners with an `Arc`.
pub struct WorkerPool {
    shared: Arc<Shared>,
    threads: Mutex<Vec<thread::JoinHandle<()>>>,
    num_threads: usize,
}

struct Shared {
    queue: TaskQueue,
    live_workers: AtomicUsize,
}

impl WorkerPool {
    /// Creates a new `WorkerPool` with the specified number of worker threads.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `num_threads` is 0, or an IO error if the
    /// operating system refuses to spawn a worker thread.
    pub fn new(num_threads: usize) -> Result<WorkerPool> {
        Self::with_thread_name(num_threads, |_| String::new())
    }

    /// Creates a new `WorkerPool` whose worker threads are named by `thread_name`.
    ///
    /// The function is called with the 0-based worker index. An empty name leaves
    /// the thread unnamed.
    pub fn with_thread_name(
        num_threads: usize,
        thread_name: impl Fn(usize) -> String,
    ) -> Result<WorkerPool> {
        verify_arg!(num_threads, num_threads > 0);

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            live_workers: AtomicUsize::new(0),
        });
        let pool = WorkerPool {
            shared: shared.clone(),
            threads: Mutex::new(Vec::with_capacity(num_threads)),
            num_threads,
        };

        for i in 0..num_threads {
            let mut builder = thread::Builder::new();
            let name = thread_name(i);
            if !name.is_empty() {
                builder = builder.name(name);
            }

            shared.live_workers.fetch_add(1, Ordering::SeqCst);
            let worker = {
                let shared = shared.clone();
                builder.spawn(move || Self::thread_fn(shared, i))
            };
            match worker {
                Ok(handle) => pool.lock_threads().push(handle),
                Err(e) => {
                    shared.live_workers.fetch_sub(1, Ordering::SeqCst);
                    // Dropping `pool` stops the workers spawned so far.
                    return Err(Error::io("spawn worker thread", e));
                }
            }
        }

        log::debug!("worker pool started with {num_threads} threads");
        Ok(pool)
    }

    /// Creates a new `WorkerPool` sized to the available parallelism of the system.
    ///
    /// Falls back to 8 threads if the parallelism cannot be determined.
    pub fn with_default_threads() -> Result<WorkerPool> {
        Self::new(Self::default_size())
    }

    /// The number of threads [`with_default_threads`](Self::with_default_threads) uses.
    pub fn default_size() -> usize {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8)
    }

    /// Spawns a single task on the pool and returns a handle to wait for its result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the pool has been shut down.
    pub fn submit<F, R>(&self, f: F) -> Result<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (task, handle) = Task::new(f);
        self.enqueue(vec![task])?;
        Ok(handle)
    }

    /// Applies `job` to every input on the worker threads and returns the results
    /// in input order.
    ///
    /// All tasks are enqueued in a single critical section, then the caller waits
    /// for each task in input order. A wait that ends without a result (the task
    /// was discarded by a concurrent [`shutdown`](Self::shutdown)) is recorded and
    /// waiting continues with the next task, so that every occurrence ends up in
    /// the returned error.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if the pool has been shut down before the call.
    /// - `Interrupted` if one or more tasks did not produce a result; the error
    ///   carries one occurrence per such task, in input order.
    ///
    /// # Panics
    ///
    /// If a job panics, the panic is re-raised on the calling thread after all
    /// tasks of the batch have been awaited.
    pub fn map<T, R, F>(&self, job: F, inputs: impl IntoIterator<Item = T>) -> Result<Vec<R>>
    where
        F: Fn(T) -> R + Send + Sync + 'static,
        T: Send + 'static,
        R: Send + 'static,
    {
        let job = Arc::new(job);
        let (tasks, handles): (Vec<_>, Vec<_>) = inputs
            .into_iter()
            .map(|input| {
                let job = job.clone();
                Task::new(move || job(input))
            })
            .unzip();
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        self.enqueue(tasks)?;
        Self::collect(handles)
    }

    /// Stops accepting work, discards the queued tasks and wakes all workers.
    ///
    /// Returns without waiting for jobs that are already running. Calling it more
    /// than once has no further effect.
    pub fn shutdown(&self) {
        let Some(discarded) = self.shared.queue.stop() else {
            return;
        };
        if !discarded.is_empty() {
            log::warn!(
                "worker pool shut down with {} queued tasks, discarding them",
                discarded.len()
            );
        }
        discarded.into_iter().for_each(Task::discard);
        log::debug!("worker pool shut down");
    }

    /// Shuts the pool down and waits for every worker thread to exit.
    ///
    /// Must not be called from within a job running on this pool.
    pub fn join(&self) {
        self.shutdown();
        let threads = std::mem::take(&mut *self.lock_threads());
        for handle in threads {
            let _ = handle.join();
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.queue.is_stopped()
    }

    /// The number of worker threads the pool was created with.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// The number of worker loops that are still running.
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers.load(Ordering::SeqCst)
    }

    /// The number of tasks waiting in the queue.
    pub fn queued_tasks(&self) -> usize {
        self.shared.queue.len()
    }
}

impl WorkerPool {
    fn enqueue(&self, tasks: Vec<Task>) -> Result<()> {
        self.shared.queue.push_batch(tasks).map_err(|rejected| {
            rejected.into_iter().for_each(Task::discard);
            Error::invalid_operation("submit to a worker pool after shutdown")
        })
    }

    fn collect<R>(handles: Vec<TaskHandle<R>>) -> Result<Vec<R>> {
        let mut results = Vec::with_capacity(handles.len());
        let mut interruptions = Vec::new();
        let mut panic = None;
        for (task_index, handle) in handles.into_iter().enumerate() {
            match handle.wait() {
                Ok(Ok(value)) => results.push(value),
                Ok(Err(payload)) => {
                    panic.get_or_insert(payload);
                }
                Err(reason) => interruptions.push(Interruption { task_index, reason }),
            }
        }
        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }
        match Error::interrupted(interruptions) {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }

    /// Worker thread function that processes tasks from the queue until it is stopped.
    fn thread_fn(shared: Arc<Shared>, index: usize) {
        while let Some(task) = shared.queue.pop() {
            task.run();
        }
        shared.live_workers.fetch_sub(1, Ordering::SeqCst);
        log::trace!("worker {index} exited");
    }

    fn lock_threads(&self) -> std::sync::MutexGuard<'_, Vec<thread::JoinHandle<()>>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
