//! Splitting of an index space into contiguous, near-equal blocks.

use std::ops::Range;

use kerma_common::{Result, error::Error, verify_arg};

/// A contiguous, non-empty index range `start..start + len` of the partitioned sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub start: usize,
    pub len: usize,
}

impl Block {
    /// One past the last index covered by the block.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Splits `0..n` into at most `max_threads` contiguous blocks.
///
/// The number of blocks is `max(1, min(max_threads, n))`. With `block_size = n / blocks`
/// and `remainder = n % blocks`, the first `remainder` blocks hold `block_size + 1`
/// elements and the rest hold `block_size`, laid out in order starting at index 0.
/// Consequently no block is empty and block lengths differ by at most one.
///
/// # Errors
///
/// - `EmptyInput` if `n` is 0.
/// - `InvalidArgument` if `max_threads` is 0.
pub fn partition(n: usize, max_threads: usize) -> Result<Vec<Block>> {
    verify_arg!(max_threads, max_threads > 0);
    if n == 0 {
        return Err(Error::empty_input("partition"));
    }

    let blocks = max_threads.min(n).max(1);
    let block_size = n / blocks;
    let remainder = n % blocks;

    let mut start = 0;
    let result = (0..blocks)
        .map(|i| {
            let len = block_size + usize::from(i < remainder);
            let block = Block { start, len };
            start += len;
            block
        })
        .collect::<Vec<_>>();
    debug_assert_eq!(start, n);
    Ok(result)
}
