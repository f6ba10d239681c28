//! Data-driven grouping with per-group accumulators.
//!
//! Blocking: `open` drains the input. Each element's representative is
//! compared with every group seen so far through the equality predicate
//! (O(groups) per element), so representatives need neither `Hash` nor `Eq`.
//! One accumulator per group is minted by the factory on first sight.

use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};

use crate::aggregate::Accumulator;
use crate::metrics::emit_event;

/// Equality used by [`AggregateGrouper::new`].
pub type DefaultEq<R> = fn(&R, &R) -> bool;

fn partial_eq<R: PartialEq>(a: &R, b: &R) -> bool {
    a == b
}

struct GroupEntry<R, A> {
    representative: R,
    aggregate: A,
}

struct Scan<I, RF, AF, E, R, A> {
    input: I,
    representative: RF,
    factory: AF,
    eq: E,
    entries: std::vec::IntoIter<GroupEntry<R, A>>,
}

impl<I, RF, AF, E, R, A> Scan<I, RF, AF, E, R, A>
where
    I: Cursor,
    RF: FnMut(&I::Item) -> R,
    AF: FnMut() -> A,
    E: FnMut(&R, &R) -> bool,
    A: Accumulator<I::Item>,
{
    fn drain_input(&mut self) -> Result<()> {
        let Scan {
            input,
            representative,
            factory,
            eq,
            ..
        } = self;
        let mut groups: Vec<GroupEntry<R, A>> = Vec::new();
        let mut rows: u64 = 0;

        while input.has_next()? {
            let item = input.next()?;
            rows += 1;
            let rep = representative(&item);
            match groups.iter_mut().find(|g| eq(&g.representative, &rep)) {
                Some(group) => group.aggregate.update(item),
                None => {
                    let mut aggregate = factory();
                    aggregate.update(item);
                    groups.push(GroupEntry {
                        representative: rep,
                        aggregate,
                    });
                }
            }
        }

        emit_event(
            "aggregate_group_drain",
            &[("rows", rows), ("groups", groups.len() as u64)],
        );
        self.entries = groups.into_iter();
        Ok(())
    }
}

impl<I, RF, AF, E, R, A> Fetch for Scan<I, RF, AF, E, R, A>
where
    I: Cursor,
    A: Accumulator<I::Item>,
{
    type Item = (R, A::Output);

    fn fetch(&mut self) -> Result<Option<Self::Item>> {
        self.entries
            .next()
            .map(|g| {
                g.aggregate
                    .value()
                    .map(|v| (g.representative, v))
                    .ok_or_else(|| Error::InvalidState("group aggregate has no value".into()))
            })
            .transpose()
    }
}

/// Yields one `(representative, aggregate)` pair per group, in order of first
/// appearance.
pub struct AggregateGrouper<I, R, A, RF, AF, E = DefaultEq<R>>
where
    I: Cursor,
    A: Accumulator<I::Item>,
{
    lookahead: Lookahead<(R, A::Output)>,
    scan: Scan<I, RF, AF, E, R, A>,
}

impl<I, R, A, RF, AF> AggregateGrouper<I, R, A, RF, AF>
where
    I: Cursor,
    R: PartialEq,
    A: Accumulator<I::Item>,
    RF: FnMut(&I::Item) -> R,
    AF: FnMut() -> A,
{
    /// Groups by `PartialEq` on the representative.
    pub fn new(input: I, representative: RF, factory: AF) -> Self {
        Self::with_equality(input, representative, factory, partial_eq::<R>)
    }
}

impl<I, R, A, RF, AF, E> AggregateGrouper<I, R, A, RF, AF, E>
where
    I: Cursor,
    A: Accumulator<I::Item>,
    RF: FnMut(&I::Item) -> R,
    AF: FnMut() -> A,
    E: FnMut(&R, &R) -> bool,
{
    pub fn with_equality(input: I, representative: RF, factory: AF, eq: E) -> Self {
        Self {
            lookahead: Lookahead::new(),
            scan: Scan {
                input,
                representative,
                factory,
                eq,
                entries: Vec::new().into_iter(),
            },
        }
    }
}

impl<I, R, A, RF, AF, E> Cursor for AggregateGrouper<I, R, A, RF, AF, E>
where
    I: Cursor,
    A: Accumulator<I::Item>,
    RF: FnMut(&I::Item) -> R,
    AF: FnMut() -> A,
    E: FnMut(&R, &R) -> bool,
{
    type Item = (R, A::Output);

    fn open(&mut self) -> Result<()> {
        let scan = &mut self.scan;
        self.lookahead.open_with(|| {
            scan.input.open()?;
            scan.drain_input()
        })
    }

    fn close(&mut self) {
        self.scan.input.close();
        self.scan.entries = Vec::new().into_iter();
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.scan)
    }

    fn next(&mut self) -> Result<Self::Item> {
        self.lookahead.next(&mut self.scan)
    }

    fn peek(&mut self) -> Result<&Self::Item> {
        self.lookahead.peek(&mut self.scan)
    }

    fn supports_reset(&self) -> bool {
        self.scan.input.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        if !self.supports_reset() {
            return Err(Error::NotSupported("reset"));
        }
        self.lookahead.check_open()?;
        self.scan.input.reset()?;
        self.lookahead.rewind();
        self.scan.drain_input()
    }
}
