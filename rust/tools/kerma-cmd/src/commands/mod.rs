//! Command implementations for kerma

use std::{fmt::Display, sync::Arc};

use anyhow::{Context, Result};
use clap::Args;
use kerma_workflow::{DedicatedThreads, ScalarReducer, SharedPool, WorkerPool};
use serde::Serialize;

pub mod extremum;
pub mod matching;

/// Options shared by every reduction command.
#[derive(Args)]
pub struct ReduceArgs {
    /// Maximum number of blocks the input is split into
    #[arg(short, long, default_value_t = WorkerPool::default_size())]
    pub threads: usize,

    /// Run the blocks on a shared worker pool of this size instead of dedicated threads
    #[arg(long, value_name = "M")]
    pub pool_size: Option<usize>,

    /// Print a JSON summary instead of the bare result
    #[arg(long)]
    pub json: bool,

    /// Values to reduce (read from stdin when omitted)
    #[arg(allow_negative_numbers = true)]
    pub values: Vec<i64>,
}

/// The predicate of `all` / `any`. Exactly one bound must be given.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct PredicateArgs {
    /// Match values strictly greater than X
    #[arg(long, value_name = "X", allow_negative_numbers = true)]
    pub gt: Option<i64>,

    /// Match values strictly less than X
    #[arg(long, value_name = "X", allow_negative_numbers = true)]
    pub lt: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matching {
    All,
    Any,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
    GreaterThan(i64),
    LessThan(i64),
}

impl Predicate {
    pub fn test(self, value: &i64) -> bool {
        match self {
            Predicate::GreaterThan(bound) => *value > bound,
            Predicate::LessThan(bound) => *value < bound,
        }
    }
}

impl TryFrom<PredicateArgs> for Predicate {
    type Error = anyhow::Error;

    fn try_from(args: PredicateArgs) -> Result<Predicate> {
        match (args.gt, args.lt) {
            (Some(bound), None) => Ok(Predicate::GreaterThan(bound)),
            (None, Some(bound)) => Ok(Predicate::LessThan(bound)),
            _ => anyhow::bail!("exactly one of --gt or --lt is required"),
        }
    }
}

/// A reducer with the executor picked from the command line.
pub enum Reducer {
    Dedicated(ScalarReducer<DedicatedThreads>),
    Pooled(ScalarReducer<SharedPool>),
}

impl Reducer {
    pub fn from_args(args: &ReduceArgs) -> Result<Reducer> {
        match args.pool_size {
            None => Ok(Reducer::Dedicated(ScalarReducer::new())),
            Some(size) => {
                let pool = WorkerPool::with_thread_name(size, |i| format!("kerma-worker-{i}"))
                    .context("failed to start the worker pool")?;
                Ok(Reducer::Pooled(ScalarReducer::with_pool(Arc::new(pool))))
            }
        }
    }

    pub fn executor_name(&self) -> &'static str {
        match self {
            Reducer::Dedicated(_) => "dedicated-threads",
            Reducer::Pooled(_) => "shared-pool",
        }
    }

    pub fn extremum(
        &self,
        extremum: Extremum,
        threads: usize,
        values: &[i64],
    ) -> kerma_common::Result<i64> {
        match (self, extremum) {
            (Reducer::Dedicated(r), Extremum::Max) => r.maximum(threads, values, i64::cmp),
            (Reducer::Dedicated(r), Extremum::Min) => r.minimum(threads, values, i64::cmp),
            (Reducer::Pooled(r), Extremum::Max) => r.maximum(threads, values, i64::cmp),
            (Reducer::Pooled(r), Extremum::Min) => r.minimum(threads, values, i64::cmp),
        }
    }

    pub fn matching(
        &self,
        matching: Matching,
        threads: usize,
        values: &[i64],
        predicate: Predicate,
    ) -> kerma_common::Result<bool> {
        let test = move |v: &i64| predicate.test(v);
        match (self, matching) {
            (Reducer::Dedicated(r), Matching::All) => r.all(threads, values, test),
            (Reducer::Dedicated(r), Matching::Any) => r.any(threads, values, test),
            (Reducer::Pooled(r), Matching::All) => r.all(threads, values, test),
            (Reducer::Pooled(r), Matching::Any) => r.any(threads, values, test),
        }
    }
}

#[derive(Serialize)]
struct Summary<R> {
    operation: &'static str,
    executor: &'static str,
    threads: usize,
    count: usize,
    result: R,
}

/// Prints the outcome of a reduction, either bare or as a JSON summary.
pub fn report<R: Serialize + Display>(
    args: &ReduceArgs,
    reducer: &Reducer,
    operation: &'static str,
    count: usize,
    result: R,
) -> Result<()> {
    if args.json {
        let summary = Summary {
            operation,
            executor: reducer.executor_name(),
            threads: args.threads,
            count,
            result,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{result}");
    }
    Ok(())
}
