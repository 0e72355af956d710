//! `max` / `min` command implementation

use anyhow::{Context, Result};

use crate::{
    commands::{Extremum, ReduceArgs, Reducer, report},
    utils::read_values,
};

pub fn run(extremum: Extremum, args: ReduceArgs) -> Result<()> {
    let values = read_values(&args.values)?;
    let reducer = Reducer::from_args(&args)?;
    let operation = match extremum {
        Extremum::Max => "max",
        Extremum::Min => "min",
    };
    log::debug!(
        "{operation} over {} values with {} threads ({})",
        values.len(),
        args.threads,
        reducer.executor_name()
    );

    let result = reducer
        .extremum(extremum, args.threads, &values)
        .with_context(|| format!("{operation} failed"))?;
    report(&args, &reducer, operation, values.len(), result)
}
