//! Strategies for computing one partial result per block of a slice.
//!
//! A [`BlockExecutor`] receives the input slice, the blocks produced by
//! [`partition`](crate::partition::partition) and a partial job, and returns one
//! partial result per block, in block order. Two strategies are provided:
//!
//! - [`DedicatedThreads`] - spawns one scoped thread per block and joins them all
//! - [`SharedPool`] - submits the blocks to a shared [`WorkerPool`], bounding the
//!   concurrency across all reductions that use the same pool

use std::{sync::Arc, thread};

use kerma_common::{Result, error::Error};

use crate::{partition::Block, worker_pool::WorkerPool};

/// Computes a partial result for each block of a slice.
pub trait BlockExecutor {
    /// Runs `partial` over `values[block.range()]` for every block.
    ///
    /// The returned vector has one entry per block, in the order of `blocks`.
    /// A panic raised by `partial` is re-raised on the calling thread.
    fn execute<T, R, F>(&self, values: &[T], blocks: &[Block], partial: F) -> Result<Vec<R>>
    where
        T: Clone + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(&[T]) -> R + Send + Sync + 'static;
}

/// Executes every block on its own scoped thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DedicatedThreads;

impl BlockExecutor for DedicatedThreads {
    fn execute<T, R, F>(&self, values: &[T], blocks: &[Block], partial: F) -> Result<Vec<R>>
    where
        T: Clone + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(&[T]) -> R + Send + Sync + 'static,
    {
        let partial = &partial;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(blocks.len());
            let mut spawn_error = None;
            for (i, block) in blocks.iter().enumerate() {
                let chunk = &values[block.range()];
                let spawned = thread::Builder::new()
                    .name(format!("kerma-block-{i}"))
                    .spawn_scoped(scope, move || partial(chunk));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_error = Some(Error::io("spawn block thread", e));
                        break;
                    }
                }
            }

            // Join everything that was spawned before reporting any failure.
            let mut results = Vec::with_capacity(handles.len());
            let mut panic = None;
            for handle in handles {
                match handle.join() {
                    Ok(value) => results.push(value),
                    Err(payload) => {
                        panic.get_or_insert(payload);
                    }
                }
            }
            if let Some(payload) = panic {
                std::panic::resume_unwind(payload);
            }
            match spawn_error {
                Some(e) => Err(e),
                None => Ok(results),
            }
        })
    }
}

/// Executes the blocks as tasks of a shared [`WorkerPool`].
#[derive(Clone)]
pub struct SharedPool {
    pool: Arc<WorkerPool>,
}

impl SharedPool {
    pub fn new(pool: Arc<WorkerPool>) -> SharedPool {
        SharedPool { pool }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

impl BlockExecutor for SharedPool {
    fn execute<T, R, F>(&self, values: &[T], blocks: &[Block], partial: F) -> Result<Vec<R>>
    where
        T: Clone + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(&[T]) -> R + Send + Sync + 'static,
    {
        // Pool tasks must be 'static, so the workers share one owned copy of the input.
        let values: Arc<[T]> = Arc::from(values);
        self.pool.map(
            move |block: Block| partial(&values[block.range()]),
            blocks.iter().copied(),
        )
    }
}
