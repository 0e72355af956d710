//! Common utilities for kerma

use anyhow::{Context, Result};
use std::io::Read;

/// Returns the values given on the command line, or reads them from stdin if there
/// are none.
pub fn read_values(args: &[i64]) -> Result<Vec<i64>> {
    if !args.is_empty() {
        return Ok(args.to_vec());
    }
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read values from stdin")?;
    parse_values(&input)
}

/// Parses whitespace-separated signed integers.
pub fn parse_values(input: &str) -> Result<Vec<i64>> {
    input
        .split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .with_context(|| format!("Invalid integer: '{token}'"))
        })
        .collect()
}
