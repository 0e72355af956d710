use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

mod commands;
mod utils;

use commands::{PredicateArgs, ReduceArgs};

#[derive(Parser)]
#[command(name = "kerma")]
#[command(about = "Parallel scalar reductions over a list of integers")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the largest value
    Max {
        #[command(flatten)]
        reduce: ReduceArgs,
    },

    /// Print the smallest value
    Min {
        #[command(flatten)]
        reduce: ReduceArgs,
    },

    /// Check whether every value satisfies the predicate
    All {
        #[command(flatten)]
        reduce: ReduceArgs,

        #[command(flatten)]
        predicate: PredicateArgs,
    },

    /// Check whether at least one value satisfies the predicate
    Any {
        #[command(flatten)]
        reduce: ReduceArgs,

        #[command(flatten)]
        predicate: PredicateArgs,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Max { reduce } => commands::extremum::run(commands::Extremum::Max, reduce),
        Commands::Min { reduce } => commands::extremum::run(commands::Extremum::Min, reduce),
        Commands::All { reduce, predicate } => {
            commands::matching::run(commands::Matching::All, reduce, predicate)
        }
        Commands::Any { reduce, predicate } => {
            commands::matching::run(commands::Matching::Any, reduce, predicate)
        }
    }
}
