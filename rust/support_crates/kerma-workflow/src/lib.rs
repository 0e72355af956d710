//! Parallel task execution and scalar reductions.
//!
//! This crate provides a fixed-size worker pool that executes submitted units of work
//! and returns their results in submission order, and a reduction layer that splits a
//! slice into contiguous blocks, computes a partial result per block in parallel and
//! folds the partials into a single value.
//!
//! # Key Components
//!
//! ## Task Execution
//!
//! - [`worker_pool::WorkerPool`] - A fixed set of worker threads fed from one FIFO
//!   queue, with ordered batch [`map`](worker_pool::WorkerPool::map) and cooperative
//!   [`shutdown`](worker_pool::WorkerPool::shutdown)
//! - [`task::TaskHandle`] - Handle for waiting on a single submitted task
//!
//! ## Reductions
//!
//! - [`partition`](mod@partition) - Splits `0..n` into contiguous blocks whose lengths differ by at
//!   most one
//! - [`block_executor`] - Per-block execution on dedicated threads or on a shared pool
//! - [`scalar::ScalarReducer`] - `maximum`, `minimum`, `all` and `any` over slices
//!
//! # Failures
//!
//! Waits that end without a result (tasks discarded by a shutdown) are reported as a
//! single `Interrupted` error that keeps every occurrence. A panicking job is never
//! retried; its panic is re-raised on the thread that collects the result.

pub mod block_executor;
pub mod partition;
pub mod scalar;
pub mod task;
mod task_queue;
pub mod worker_pool;

pub use block_executor::{BlockExecutor, DedicatedThreads, SharedPool};
pub use partition::{Block, partition};
pub use scalar::ScalarReducer;
pub use task::{TaskHandle, TaskState};
pub use worker_pool::WorkerPool;
