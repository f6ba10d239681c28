//! External sort: replacement-selection runs plus k-way merge.
//!
//! `open` drains the run generator, cutting its output into runs at every
//! descent, then merges at most `fan_in` runs at a time. When more runs exist
//! intermediate passes reduce them first; the final pass is lazy.
//!
//! Equal elements from different runs come out in run order.
//!
//! This is an in-memory multi-pass merge: every run is materialized during
//! `open`, so the whole input is resident while merging. The memory bound
//! (`memory_rows`, plus any budget on a generator passed to `from_runs`)
//! covers run generation only.

use std::cmp::Ordering;

use seqops_core::config::OperatorConfig;
use seqops_core::cursor::{drain, Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};
use seqops_core::order::Comparator;

use crate::group::{SortBasedGrouper, StartsGroup};
use crate::metrics::emit_event;
use crate::sort::heap::BoundedHeap;
use crate::sort::run::RunGenerator;

/// Run boundary: the next element compares below the previous one.
#[derive(Debug, Clone)]
pub struct Descent<C>(pub C);

impl<T, C: Comparator<T>> StartsGroup<T> for Descent<C> {
    fn starts_group(&mut self, prev: &T, next: &T) -> bool {
        self.0.compare(prev, next) == Ordering::Greater
    }
}

/// Head of one run inside the merge heap.
struct Head<T> {
    value: T,
    run: usize,
}

/// Orders heads by value, then by run index.
struct HeadOrder<C>(C);

impl<T, C: Comparator<T>> Comparator<Head<T>> for HeadOrder<C> {
    fn compare(&self, a: &Head<T>, b: &Head<T>) -> Ordering {
        self.0
            .compare(&a.value, &b.value)
            .then_with(|| a.run.cmp(&b.run))
    }
}

/// Lazy merge of sorted in-memory runs.
struct KWayMerge<T, C> {
    runs: Vec<std::vec::IntoIter<T>>,
    heap: BoundedHeap<Head<T>, HeadOrder<C>>,
}

impl<T, C: Comparator<T>> KWayMerge<T, C> {
    fn new(runs: Vec<Vec<T>>, cmp: C) -> Result<Self> {
        let mut runs: Vec<_> = runs.into_iter().map(Vec::into_iter).collect();
        let heads: Vec<Head<T>> = runs
            .iter_mut()
            .enumerate()
            .filter_map(|(run, it)| it.next().map(|value| Head { value, run }))
            .collect();
        let heap = BoundedHeap::from_vec(heads, runs.len(), HeadOrder(cmp))?;
        Ok(Self { runs, heap })
    }

    fn pop(&mut self) -> Result<Option<T>> {
        if self.heap.is_empty() {
            return Ok(None);
        }
        let run = self.heap.peek()?.run;
        let head = match self.runs[run].next() {
            Some(value) => self.heap.replace(Head { value, run })?,
            None => self.heap.dequeue()?,
        };
        Ok(Some(head.value))
    }

    fn into_vec(mut self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        while let Some(v) = self.pop()? {
            out.push(v);
        }
        Ok(out)
    }
}

struct Merge<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    runs: SortBasedGrouper<RunGenerator<I, C>, Descent<C>>,
    fan_in: usize,
    cmp: C,
    merge: Option<KWayMerge<I::Item, C>>,
    run_count: usize,
}

impl<I, C> Merge<I, C>
where
    I: Cursor,
    I::Item: Clone,
    C: Comparator<I::Item> + Clone,
{
    fn build(&mut self) -> Result<()> {
        let mut runs: Vec<Vec<I::Item>> = Vec::new();
        while self.runs.has_next()? {
            let mut run = self.runs.next()?;
            runs.push(drain(&mut run)?);
        }
        self.run_count = runs.len();

        let mut passes: u64 = 0;
        while runs.len() > self.fan_in {
            passes += 1;
            let mut pending = runs.into_iter();
            let mut merged = Vec::new();
            loop {
                let chunk: Vec<_> = pending.by_ref().take(self.fan_in).collect();
                if chunk.is_empty() {
                    break;
                }
                merged.push(KWayMerge::new(chunk, self.cmp.clone())?.into_vec()?);
            }
            runs = merged;
        }

        emit_event(
            "merge",
            &[
                ("runs", self.run_count as u64),
                ("passes", passes + 1),
                ("fan_in", self.fan_in as u64),
            ],
        );
        self.merge = Some(KWayMerge::new(runs, self.cmp.clone())?);
        Ok(())
    }
}

impl<I, C> Fetch for Merge<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    type Item = I::Item;

    fn fetch(&mut self) -> Result<Option<I::Item>> {
        match self.merge.as_mut() {
            Some(m) => m.pop(),
            None => Ok(None),
        }
    }
}

pub struct ExternalSort<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    lookahead: Lookahead<I::Item>,
    merge: Merge<I, C>,
}

impl<I, C> ExternalSort<I, C>
where
    I: Cursor,
    I::Item: Clone,
    C: Comparator<I::Item> + Clone,
{
    pub fn new(input: I, memory_rows: usize, fan_in: usize, cmp: C) -> Result<Self> {
        let runs = RunGenerator::new(input, memory_rows, cmp)?;
        Self::from_runs(runs, fan_in)
    }

    pub fn from_config(input: I, cfg: &OperatorConfig, cmp: C) -> Result<Self> {
        cfg.validate()?;
        Self::new(input, cfg.run_memory_rows, cfg.merge_fan_in, cmp)
    }

    /// Sort the output of an already configured run generator (for example
    /// one carrying a memory budget).
    pub fn from_runs(runs: RunGenerator<I, C>, fan_in: usize) -> Result<Self> {
        if fan_in < 2 {
            return Err(Error::InvalidArgument(format!(
                "merge fan-in must be at least 2, got {fan_in}"
            )));
        }
        let cmp = runs.comparator().clone();
        Ok(Self {
            lookahead: Lookahead::new(),
            merge: Merge {
                runs: SortBasedGrouper::new(runs, Descent(cmp.clone())),
                fan_in,
                cmp,
                merge: None,
                run_count: 0,
            },
        })
    }

    /// Runs produced by run generation on the last open/reset.
    pub fn run_count(&self) -> usize {
        self.merge.run_count
    }
}

impl<I, C> Cursor for ExternalSort<I, C>
where
    I: Cursor,
    I::Item: Clone,
    C: Comparator<I::Item> + Clone,
{
    type Item = I::Item;

    fn open(&mut self) -> Result<()> {
        let merge = &mut self.merge;
        self.lookahead.open_with(|| {
            merge.runs.open()?;
            merge.build()
        })
    }

    fn close(&mut self) {
        self.merge.runs.close();
        self.merge.merge = None;
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.merge)
    }

    fn next(&mut self) -> Result<I::Item> {
        self.lookahead.next(&mut self.merge)
    }

    fn peek(&mut self) -> Result<&I::Item> {
        self.lookahead.peek(&mut self.merge)
    }

    fn supports_reset(&self) -> bool {
        self.merge.runs.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        if !self.supports_reset() {
            return Err(Error::NotSupported("reset"));
        }
        self.lookahead.check_open()?;
        self.merge.runs.reset()?;
        self.merge.merge = None;
        self.lookahead.rewind();
        self.merge.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;
    use seqops_core::order::Natural;

    #[test]
    fn test_merge_breaks_ties_by_run() {
        let runs = vec![vec![(1, 'a'), (3, 'a')], vec![(1, 'b'), (2, 'b')]];
        let by_key = |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0);
        let merged = KWayMerge::new(runs, by_key).unwrap().into_vec().unwrap();
        assert_eq!(merged, vec![(1, 'a'), (1, 'b'), (2, 'b'), (3, 'a')]);
    }

    #[test]
    fn test_intermediate_passes() {
        let input: Vec<u32> = (0..40).map(|i| (i * 7919) % 41).collect();
        let mut sort = ExternalSort::new(VecSource::new(input.clone()), 2, 2, Natural).unwrap();
        sort.open().unwrap();
        let out = drain(&mut sort).unwrap();
        let mut expected = input;
        expected.sort_unstable();
        assert_eq!(out, expected);
        assert!(sort.run_count() > 2);
    }
}
