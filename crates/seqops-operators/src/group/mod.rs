//! Grouping operators.
//!
//! - [`HashGrouper`]: strict, partitions the whole input by a hashable key.
//! - [`SortBasedGrouper`]: lazy, splits pre-sorted input where a boundary
//!   predicate fires; one live group at a time.
//! - [`AggregateGrouper`]: strict, linear scan over representatives compared
//!   with an arbitrary equality, folding each group through an accumulator.

pub mod aggregate;
pub mod hash;
pub mod sorted;

pub use aggregate::AggregateGrouper;
pub use hash::HashGrouper;
pub use sorted::{SortBasedGrouper, SortedGroup};

use seqops_core::cursor::{Cursor, CursorState};
use seqops_core::error::Result;

use crate::source::VecSource;

/// Decides, for two consecutive input elements, whether `next` opens a new
/// group. Implemented by every `FnMut(&T, &T) -> bool`.
pub trait StartsGroup<T> {
    fn starts_group(&mut self, prev: &T, next: &T) -> bool;
}

impl<T, F> StartsGroup<T> for F
where
    F: FnMut(&T, &T) -> bool,
{
    fn starts_group(&mut self, prev: &T, next: &T) -> bool {
        self(prev, next)
    }
}

/// One materialized group: its key and its elements in insertion order.
#[derive(Debug, Clone)]
pub struct Bucket<K, T> {
    key: K,
    rows: VecSource<T>,
}

impl<K, T> Bucket<K, T> {
    pub(crate) fn new(key: K, rows: Vec<T>) -> Self {
        Self {
            key,
            rows: VecSource::opened(rows),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_parts(self) -> (K, Vec<T>) {
        (self.key, self.rows.into_inner())
    }
}

impl<K, T: Clone> Cursor for Bucket<K, T> {
    type Item = T;

    fn open(&mut self) -> Result<()> {
        self.rows.open()
    }

    fn close(&mut self) {
        self.rows.close();
    }

    fn state(&self) -> CursorState {
        self.rows.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.rows.has_next()
    }

    fn next(&mut self) -> Result<T> {
        self.rows.next()
    }

    fn peek(&mut self) -> Result<&T> {
        self.rows.peek()
    }

    fn supports_reset(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<()> {
        self.rows.reset()
    }
}
