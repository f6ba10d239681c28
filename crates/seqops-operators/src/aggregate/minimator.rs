//! Incremental extremum with ties.
//!
//! [`Extremum`] keeps the best key seen so far and the bucket of every element
//! that produced it, in encounter order. [`Minimator`] runs it through an
//! [`Aggregator`] so each pull reports the minimum over the prefix consumed.
//! Maximizing is done with `order::reverse(cmp)`.
//!
//! There is one live entry. Every pull hands out another handle to it, so a
//! handle taken earlier shows the latest state, not a snapshot. Holding a
//! borrow of the entry across a pull detaches the accumulator onto a copy.

use std::cell::{Ref, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

use seqops_core::cursor::{Cursor, CursorState};
use seqops_core::error::Result;
use seqops_core::order::Comparator;

use crate::aggregate::{Accumulator, Aggregator};

/// Best key so far plus the elements tied on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry<K, T> {
    pub key: K,
    pub bucket: Vec<T>,
}

/// Handle to the live entry of an [`Extremum`].
pub type SharedEntry<K, T> = Rc<RefCell<MapEntry<K, T>>>;

pub struct Extremum<T, K, M, C> {
    mapping: M,
    cmp: C,
    best: Option<SharedEntry<K, T>>,
}

impl<T, K, M, C> Extremum<T, K, M, C> {
    pub fn new(mapping: M, cmp: C) -> Self {
        Self {
            mapping,
            cmp,
            best: None,
        }
    }

    pub fn current(&self) -> Option<Ref<'_, MapEntry<K, T>>> {
        self.best.as_ref().map(|entry| entry.borrow())
    }
}

impl<T, K, M, C> Accumulator<T> for Extremum<T, K, M, C>
where
    T: Clone,
    K: Clone,
    M: FnMut(&T) -> K,
    C: Comparator<K>,
{
    type Output = SharedEntry<K, T>;

    fn update(&mut self, value: T) {
        let key = (self.mapping)(&value);
        let Some(shared) = self.best.as_mut() else {
            self.best = Some(Rc::new(RefCell::new(MapEntry {
                key,
                bucket: vec![value],
            })));
            return;
        };
        if shared.try_borrow_mut().is_err() {
            let detached = shared.borrow().clone();
            *shared = Rc::new(RefCell::new(detached));
        }
        let mut entry = shared.borrow_mut();
        match self.cmp.compare(&key, &entry.key) {
            Ordering::Less => {
                entry.bucket.clear();
                entry.key = key;
                entry.bucket.push(value);
            }
            Ordering::Equal => entry.bucket.push(value),
            Ordering::Greater => {}
        }
    }

    fn value(&self) -> Option<SharedEntry<K, T>> {
        self.best.clone()
    }

    fn reset(&mut self) {
        self.best = None;
    }
}

/// Lazy minimum tracker: yields the current `(key, bucket)` after each input
/// element. Only the last value is definitive.
pub struct Minimator<I, K, M, C>
where
    I: Cursor,
    I::Item: Clone,
    K: Clone,
    M: FnMut(&I::Item) -> K,
    C: Comparator<K>,
{
    inner: Aggregator<I, Extremum<I::Item, K, M, C>>,
}

impl<I, K, M, C> Minimator<I, K, M, C>
where
    I: Cursor,
    I::Item: Clone,
    K: Clone,
    M: FnMut(&I::Item) -> K,
    C: Comparator<K>,
{
    pub fn new(input: I, mapping: M, cmp: C) -> Self {
        Self {
            inner: Aggregator::new(input, Extremum::new(mapping, cmp)),
        }
    }

    /// Extremum over everything consumed so far, without pulling.
    pub fn current(&self) -> Option<Ref<'_, MapEntry<K, I::Item>>> {
        self.inner.accumulator().current()
    }

    /// Drain the input and copy out the final entry.
    pub fn finish(&mut self) -> Result<Option<MapEntry<K, I::Item>>> {
        match self.inner.finish()? {
            Some(entry) => {
                let last = entry.borrow().clone();
                Ok(Some(last))
            }
            None => Ok(None),
        }
    }
}

impl<I, K, M, C> Cursor for Minimator<I, K, M, C>
where
    I: Cursor,
    I::Item: Clone,
    K: Clone,
    M: FnMut(&I::Item) -> K,
    C: Comparator<K>,
{
    type Item = SharedEntry<K, I::Item>;

    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn close(&mut self) {
        self.inner.close()
    }

    fn state(&self) -> CursorState {
        self.inner.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.inner.has_next()
    }

    fn next(&mut self) -> Result<Self::Item> {
        self.inner.next()
    }

    fn peek(&mut self) -> Result<&Self::Item> {
        self.inner.peek()
    }

    fn supports_reset(&self) -> bool {
        self.inner.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }
}
