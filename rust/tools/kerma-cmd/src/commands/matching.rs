//! `all` / `any` command implementation

use anyhow::{Context, Result};

use crate::{
    commands::{Matching, Predicate, PredicateArgs, ReduceArgs, Reducer, report},
    utils::read_values,
};

pub fn run(matching: Matching, args: ReduceArgs, predicate: PredicateArgs) -> Result<()> {
    let predicate = Predicate::try_from(predicate)?;
    let values = read_values(&args.values)?;
    let reducer = Reducer::from_args(&args)?;
    let operation = match matching {
        Matching::All => "all",
        Matching::Any => "any",
    };
    log::debug!(
        "{operation} {predicate:?} over {} values with {} threads ({})",
        values.len(),
        args.threads,
        reducer.executor_name()
    );

    let result = reducer
        .matching(matching, args.threads, &values, predicate)
        .with_context(|| format!("{operation} failed"))?;
    report(&args, &reducer, operation, values.len(), result)
}
