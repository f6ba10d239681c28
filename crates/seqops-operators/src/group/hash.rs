//! Hash grouping.
//!
//! This is a **blocking** operator: `open` drains the whole input into
//! in-memory buckets (O(input) memory) before the first group is produced.
//! Groups come out in order of first appearance of their key.

use std::collections::HashMap;
use std::hash::Hash;

use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};

use crate::group::Bucket;
use crate::metrics::emit_event;

pub struct HashGrouper<I: Cursor, K, F> {
    lookahead: Lookahead<Bucket<K, I::Item>>,
    partition: Partition<I, K, F>,
}

struct Partition<I: Cursor, K, F> {
    input: I,
    key_fn: F,
    buckets: std::vec::IntoIter<(K, Vec<I::Item>)>,
}

impl<I, K, F> Partition<I, K, F>
where
    I: Cursor,
    K: Hash + Eq + Clone,
    F: FnMut(&I::Item) -> K,
{
    fn drain_input(&mut self) -> Result<()> {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut buckets: Vec<(K, Vec<I::Item>)> = Vec::new();
        let mut rows: u64 = 0;

        while self.input.has_next()? {
            let row = self.input.next()?;
            rows += 1;
            let key = (self.key_fn)(&row);
            match index.get(&key) {
                Some(&slot) => buckets[slot].1.push(row),
                None => {
                    index.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![row]));
                }
            }
        }

        emit_event(
            "hash_group_drain",
            &[("rows", rows), ("groups", buckets.len() as u64)],
        );
        self.buckets = buckets.into_iter();
        Ok(())
    }
}

impl<I: Cursor, K, F> Fetch for Partition<I, K, F> {
    type Item = Bucket<K, I::Item>;

    fn fetch(&mut self) -> Result<Option<Self::Item>> {
        Ok(self
            .buckets
            .next()
            .map(|(key, rows)| Bucket::new(key, rows)))
    }
}

impl<I, K, F> HashGrouper<I, K, F>
where
    I: Cursor,
    K: Hash + Eq + Clone,
    F: FnMut(&I::Item) -> K,
{
    pub fn new(input: I, key_fn: F) -> Self {
        Self {
            lookahead: Lookahead::new(),
            partition: Partition {
                input,
                key_fn,
                buckets: Vec::new().into_iter(),
            },
        }
    }
}

impl<I, K, F> Cursor for HashGrouper<I, K, F>
where
    I: Cursor,
    K: Hash + Eq + Clone,
    F: FnMut(&I::Item) -> K,
{
    type Item = Bucket<K, I::Item>;

    fn open(&mut self) -> Result<()> {
        let partition = &mut self.partition;
        self.lookahead.open_with(|| {
            partition.input.open()?;
            partition.drain_input()
        })
    }

    fn close(&mut self) {
        self.partition.input.close();
        self.partition.buckets = Vec::new().into_iter();
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.partition)
    }

    fn next(&mut self) -> Result<Self::Item> {
        self.lookahead.next(&mut self.partition)
    }

    fn peek(&mut self) -> Result<&Self::Item> {
        self.lookahead.peek(&mut self.partition)
    }

    fn supports_reset(&self) -> bool {
        self.partition.input.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        if !self.supports_reset() {
            return Err(Error::NotSupported("reset"));
        }
        self.lookahead.check_open()?;
        self.partition.input.reset()?;
        self.lookahead.rewind();
        self.partition.drain_input()
    }
}
