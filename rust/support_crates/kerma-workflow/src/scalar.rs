//! Parallel scalar reductions over slices.
//!
//! [`ScalarReducer`] splits the input into contiguous blocks with
//! [`partition`], computes one partial result per block through its
//! [`BlockExecutor`] and folds the partials, in block order, into the final value.
//! The executor is chosen when the reducer is constructed:
//!
//! - [`ScalarReducer::new`] spawns dedicated threads for every reduction
//! - [`ScalarReducer::with_pool`] runs the blocks on a shared [`WorkerPool`]

use std::{cmp::Ordering, sync::Arc};

use kerma_common::{Result, error::Error, verify_arg};

use crate::{
    block_executor::{BlockExecutor, DedicatedThreads, SharedPool},
    partition::partition,
    worker_pool::WorkerPool,
};

/// Computes maximum, minimum, "all match" and "any match" reductions in parallel.
///
/// `threads` bounds the number of blocks a reduction is split into; it is capped by
/// the input length. Inputs are required to be `Clone` so that the shared pool
/// strategy can hand an owned copy of the input to its workers.
#[derive(Debug, Clone, Default)]
pub struct ScalarReducer<E = DedicatedThreads> {
    executor: E,
}

impl ScalarReducer<DedicatedThreads> {
    /// Creates a reducer that spawns one dedicated thread per block.
    pub fn new() -> Self {
        ScalarReducer {
            executor: DedicatedThreads,
        }
    }
}

impl ScalarReducer<SharedPool> {
    /// Creates a reducer that delegates the per-block work to `pool`.
    pub fn with_pool(pool: Arc<WorkerPool>) -> Self {
        ScalarReducer {
            executor: SharedPool::new(pool),
        }
    }
}

impl<E: BlockExecutor> ScalarReducer<E> {
    pub fn with_executor(executor: E) -> Self {
        ScalarReducer { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Generic two-phase reduction.
    ///
    /// `partial_job` runs once per block (in parallel); `final_job` folds the
    /// partial results, given in block order. An empty input produces no blocks
    /// and `final_job` receives an empty vector.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `threads` is 0, plus any error of the executor.
    pub fn reduce<T, P, R, F, G>(
        &self,
        threads: usize,
        values: &[T],
        partial_job: F,
        final_job: G,
    ) -> Result<R>
    where
        T: Clone + Send + Sync + 'static,
        P: Send + 'static,
        F: Fn(&[T]) -> P + Send + Sync + 'static,
        G: FnOnce(Vec<P>) -> R,
    {
        verify_arg!(threads, threads > 0);
        if values.is_empty() {
            return Ok(final_job(Vec::new()));
        }

        let blocks = partition(values.len(), threads)?;
        log::trace!(
            "reducing {} values in {} blocks",
            values.len(),
            blocks.len()
        );
        let partials = self.executor.execute(values, &blocks, partial_job)?;
        Ok(final_job(partials))
    }

    /// Returns the maximum element under `comparator`.
    ///
    /// When several elements are maximal, the last one is returned.
    ///
    /// # Errors
    ///
    /// `EmptyInput` if `values` is empty (checked before any thread is spawned),
    /// `InvalidArgument` if `threads` is 0.
    pub fn maximum<T, C>(&self, threads: usize, values: &[T], comparator: C) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        if values.is_empty() {
            return Err(Error::empty_input("maximum"));
        }

        let comparator = Arc::new(comparator);
        let partial_cmp = comparator.clone();
        self.reduce(
            threads,
            values,
            move |block| block.iter().max_by(|a, b| partial_cmp(*a, *b)).cloned(),
            |partials| {
                partials
                    .into_iter()
                    .flatten()
                    .max_by(|a, b| comparator(a, b))
            },
        )?
        .ok_or_else(|| Error::empty_input("maximum"))
    }

    /// Returns the minimum element under `comparator`.
    ///
    /// Equivalent to [`maximum`](Self::maximum) with the comparator reversed, so
    /// when several elements are minimal, the last one is returned.
    pub fn minimum<T, C>(&self, threads: usize, values: &[T], comparator: C) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        if values.is_empty() {
            return Err(Error::empty_input("minimum"));
        }
        self.maximum(threads, values, move |a, b| comparator(b, a))
    }

    /// Returns `true` if every element satisfies `predicate` (`true` for empty input).
    pub fn all<T, P>(&self, threads: usize, values: &[T], predicate: P) -> Result<bool>
    where
        T: Clone + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.reduce(
            threads,
            values,
            move |block| block.iter().all(&predicate),
            |partials| partials.into_iter().all(|matched| matched),
        )
    }

    /// Returns `true` if at least one element satisfies `predicate` (`false` for empty input).
    pub fn any<T, P>(&self, threads: usize, values: &[T], predicate: P) -> Result<bool>
    where
        T: Clone + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.reduce(
            threads,
            values,
            move |block| block.iter().any(&predicate),
            |partials| partials.into_iter().any(|matched| matched),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use kerma_common::error::ErrorKind;

    use super::ScalarReducer;
    use crate::worker_pool::WorkerPool;

    #[test]
    fn test_example_values() {
        let reducer = ScalarReducer::new();
        let values = vec![5, 3, 8, 1];
        assert_eq!(reducer.maximum(2, &values, i32::cmp).unwrap(), 8);
        assert_eq!(reducer.minimum(2, &values, i32::cmp).unwrap(), 1);
        assert!(reducer.all(2, &values, |v| *v > 0).unwrap());
        assert!(!reducer.any(2, &values, |v| *v > 10).unwrap());
    }

    #[test]
    fn test_empty_input() {
        let reducer = ScalarReducer::new();
        let values: Vec<i32> = Vec::new();
        let err = reducer.maximum(2, &values, i32::cmp).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::EmptyInput { .. }));
        let err = reducer.minimum(2, &values, i32::cmp).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::EmptyInput { .. }));
        // Empty input is reported even when the thread count is invalid.
        let err = reducer.maximum(0, &values, i32::cmp).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::EmptyInput { .. }));
        let err = reducer.minimum(0, &values, i32::cmp).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::EmptyInput { .. }));
        assert!(reducer.all(2, &values, |v| *v > 0).unwrap());
        assert!(!reducer.any(2, &values, |v| *v > 0).unwrap());
    }

    #[test]
    fn test_zero_threads() {
        let reducer = ScalarReducer::new();
        let values = vec![1, 2, 3];
        let is_invalid = |err: kerma_common::error::Error| {
            matches!(err.kind(), ErrorKind::InvalidArgument { .. })
        };
        assert!(is_invalid(reducer.maximum(0, &values, i32::cmp).unwrap_err()));
        assert!(is_invalid(reducer.minimum(0, &values, i32::cmp).unwrap_err()));
        assert!(is_invalid(reducer.all(0, &values, |_| true).unwrap_err()));
        assert!(is_invalid(reducer.any(0, &values, |_| true).unwrap_err()));
    }

    #[test]
    fn test_custom_comparator() {
        let reducer = ScalarReducer::new();
        let words = ["kiwi", "banana", "fig", "cherry"].map(String::from).to_vec();
        let longest = reducer
            .maximum(3, &words, |a: &String, b: &String| a.len().cmp(&b.len()))
            .unwrap();
        // "banana" and "cherry" tie; the last maximal element wins.
        assert_eq!(longest, "cherry");
        let shortest = reducer
            .minimum(3, &words, |a: &String, b: &String| a.len().cmp(&b.len()))
            .unwrap();
        assert_eq!(shortest, "fig");
    }

    #[test]
    fn test_with_pool() {
        let pool = Arc::new(WorkerPool::new(3).unwrap());
        let reducer = ScalarReducer::with_pool(pool.clone());
        let values = (0..1000).map(|i| (i * 7919) % 1009).collect::<Vec<i64>>();
        assert_eq!(reducer.maximum(8, &values, i64::cmp).unwrap(), 1008);
        assert_eq!(reducer.minimum(8, &values, i64::cmp).unwrap(), 0);
        assert!(reducer.all(8, &values, |v| *v < 1009).unwrap());
        assert!(reducer.any(8, &values, |v| *v == 500).unwrap());
        assert_eq!(pool.live_workers(), 3);
    }

    #[test]
    fn test_partial_job_runs_once_per_block() {
        let reducer = ScalarReducer::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let values = (0..10).collect::<Vec<u32>>();
        let total = reducer
            .reduce(
                4,
                &values,
                move |block| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    block.iter().sum::<u32>()
                },
                |partials| {
                    assert_eq!(partials, vec![3, 12, 13, 17]);
                    partials.into_iter().sum::<u32>()
                },
            )
            .unwrap();
        assert_eq!(total, 45);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_threads_capped_by_input_length() {
        let reducer = ScalarReducer::new();
        let values = vec![4, 9];
        let blocks = reducer
            .reduce(16, &values, |block| block.len(), |partials| partials)
            .unwrap();
        assert_eq!(blocks, vec![1, 1]);
    }
}
