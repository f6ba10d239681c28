//! Replacement-selection run generation.
//!
//! A heap of at most `size` elements feeds the output. An incoming element
//! that still fits the current run replaces the emitted minimum in the heap;
//! one that does not is staged in the slot the minimum freed and seeds the
//! next run. Heap plus staging area never hold more than `size` elements.
//!
//! Run boundaries are not marked in the output: a run ends where the next
//! element compares lower than the previous one. Wrap the generator in a
//! `SortBasedGrouper` with a descent predicate to get one nested cursor per
//! run.

use std::cmp::Ordering;

use seqops_core::config::OperatorConfig;
use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};
use seqops_core::order::Comparator;
use seqops_mem::{BudgetGuardImpl, MemoryBudgetImpl, PeakTracker};

use crate::metrics::emit_event;
use crate::sort::heap::BoundedHeap;

pub struct RunGenerator<I: Cursor, C> {
    lookahead: Lookahead<I::Item>,
    selection: Selection<I, C>,
}

struct Selection<I: Cursor, C> {
    input: I,
    size: usize,
    heap: BoundedHeap<I::Item, C>,
    /// Elements held back for the next run.
    staged: Vec<I::Item>,
    runs_started: u64,
    budget: Option<MemoryBudgetImpl>,
    guard: Option<BudgetGuardImpl>,
    tracker: PeakTracker,
}

impl<I, C> Selection<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    /// Pull up to `size` elements and heapify them.
    fn fill(&mut self) -> Result<()> {
        while self.staged.len() < self.size && self.input.has_next()? {
            self.staged.push(self.input.next()?);
        }
        self.heap.refill(&mut self.staged)?;
        self.runs_started = u64::from(!self.heap.is_empty());
        self.tracker.record(self.heap.len());
        Ok(())
    }

    fn discard(&mut self) {
        self.heap.clear();
        self.staged.clear();
        self.runs_started = 0;
    }
}

impl<I, C> Fetch for Selection<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    type Item = I::Item;

    fn fetch(&mut self) -> Result<Option<I::Item>> {
        if self.heap.is_empty() {
            if self.staged.is_empty() {
                return Ok(None);
            }
            self.heap.refill(&mut self.staged)?;
            self.runs_started += 1;
            emit_event(
                "run_boundary",
                &[("run", self.runs_started), ("seed", self.heap.len() as u64)],
            );
        }

        let out = if self.input.has_next()? {
            let fits = self.heap.comparator().compare(self.heap.peek()?, self.input.peek()?)
                != Ordering::Greater;
            let incoming = self.input.next()?;
            if fits {
                self.heap.replace(incoming)?
            } else {
                let min = self.heap.dequeue()?;
                self.staged.push(incoming);
                min
            }
        } else {
            self.heap.dequeue()?
        };

        self.tracker.record(self.heap.len() + self.staged.len());
        Ok(Some(out))
    }
}

impl<I, C> RunGenerator<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    /// `size` bounds the elements held in memory; it must be positive.
    pub fn new(input: I, size: usize, cmp: C) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument(
                "run generator needs a memory bound of at least one element".into(),
            ));
        }
        Ok(Self {
            lookahead: Lookahead::new(),
            selection: Selection {
                input,
                size,
                heap: BoundedHeap::new(size, cmp),
                staged: Vec::with_capacity(size),
                runs_started: 0,
                budget: None,
                guard: None,
                tracker: PeakTracker::new(),
            },
        })
    }

    pub fn from_config(input: I, cfg: &OperatorConfig, cmp: C) -> Result<Self> {
        cfg.validate()?;
        Self::new(input, cfg.run_memory_rows, cmp)
    }

    /// Reserve the working set from `budget` when opened.
    pub fn with_budget(mut self, budget: MemoryBudgetImpl) -> Self {
        self.selection.budget = Some(budget);
        self
    }

    pub fn memory_rows(&self) -> usize {
        self.selection.size
    }

    pub fn comparator(&self) -> &C {
        self.selection.heap.comparator()
    }

    /// Largest number of elements held at once (heap plus staged).
    pub fn peak_resident(&self) -> usize {
        self.selection.tracker.peak()
    }

    /// Runs begun so far, including the one being emitted.
    pub fn runs_started(&self) -> u64 {
        self.selection.runs_started
    }
}

impl<I, C> Cursor for RunGenerator<I, C>
where
    I: Cursor,
    C: Comparator<I::Item>,
{
    type Item = I::Item;

    fn open(&mut self) -> Result<()> {
        let sel = &mut self.selection;
        self.lookahead.open_with(|| {
            let unreserved = sel.guard.is_none();
            if let Some(budget) = sel.budget.as_ref().filter(|_| unreserved) {
                sel.guard = Some(budget.reserve_elements::<I::Item>(sel.size, "run_gen")?);
            }
            sel.input.open()?;
            sel.fill()
        })
    }

    fn close(&mut self) {
        self.selection.input.close();
        self.selection.discard();
        self.selection.guard = None;
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.selection)
    }

    fn next(&mut self) -> Result<I::Item> {
        self.lookahead.next(&mut self.selection)
    }

    fn peek(&mut self) -> Result<&I::Item> {
        self.lookahead.peek(&mut self.selection)
    }

    fn supports_reset(&self) -> bool {
        self.selection.input.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        if !self.supports_reset() {
            return Err(Error::NotSupported("reset"));
        }
        self.lookahead.check_open()?;
        self.selection.input.reset()?;
        self.selection.discard();
        self.selection.tracker.clear();
        self.lookahead.rewind();
        self.selection.fill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;
    use seqops_core::cursor::drain;
    use seqops_core::order::{reverse, Natural};

    #[test]
    fn test_replacement_selection_split() {
        let mut rg = RunGenerator::new(VecSource::new(vec![5, 3, 8, 1, 9, 2]), 3, Natural).unwrap();
        rg.open().unwrap();
        assert_eq!(drain(&mut rg).unwrap(), vec![3, 5, 8, 9, 1, 2]);
        assert_eq!(rg.runs_started(), 2);
        assert!(rg.peak_resident() <= 3);
    }

    #[test]
    fn test_descending_runs_via_reverse() {
        let mut rg =
            RunGenerator::new(VecSource::new(vec![5, 3, 8, 1, 9, 2]), 3, reverse(Natural)).unwrap();
        rg.open().unwrap();
        // heap {5,3,8}: 8 out (1 fits), 5 out (9 staged), 3 out (2 fits), 2, 1; then 9
        assert_eq!(drain(&mut rg).unwrap(), vec![8, 5, 3, 2, 1, 9]);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = RunGenerator::new(VecSource::new(vec![1]), 0, Natural).err().unwrap();
        assert_eq!(err.kind(), seqops_core::ErrorKind::InvalidArgument);
    }
}
