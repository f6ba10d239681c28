//! Lazily folding aggregator.
//!
//! Every pull consumes exactly one input element and yields the running
//! aggregate. The last value produced is the aggregate of the whole input.

use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};

use crate::aggregate::Accumulator;

pub struct Aggregator<I: Cursor, A: Accumulator<I::Item>> {
    lookahead: Lookahead<A::Output>,
    fold: Fold<I, A>,
}

struct Fold<I, A> {
    input: I,
    acc: A,
}

impl<I, A> Fetch for Fold<I, A>
where
    I: Cursor,
    A: Accumulator<I::Item>,
{
    type Item = A::Output;

    fn fetch(&mut self) -> Result<Option<A::Output>> {
        if !self.input.has_next()? {
            return Ok(None);
        }
        let item = self.input.next()?;
        self.acc.update(item);
        self.acc
            .value()
            .map(Some)
            .ok_or_else(|| Error::InvalidState("accumulator has no value after update".into()))
    }
}

impl<I, A> Aggregator<I, A>
where
    I: Cursor,
    A: Accumulator<I::Item>,
{
    pub fn new(input: I, acc: A) -> Self {
        Self {
            lookahead: Lookahead::new(),
            fold: Fold { input, acc },
        }
    }

    pub fn accumulator(&self) -> &A {
        &self.fold.acc
    }

    /// Open if needed, consume the rest of the input and return the final
    /// aggregate (`None` if the accumulator never produced a value).
    pub fn finish(&mut self) -> Result<Option<A::Output>> {
        self.open()?;
        while self.has_next()? {
            self.next()?;
        }
        Ok(self.fold.acc.value())
    }
}

impl<I, A> Cursor for Aggregator<I, A>
where
    I: Cursor,
    A: Accumulator<I::Item>,
{
    type Item = A::Output;

    fn open(&mut self) -> Result<()> {
        let input = &mut self.fold.input;
        self.lookahead.open_with(|| input.open())
    }

    fn close(&mut self) {
        self.fold.input.close();
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.fold)
    }

    fn next(&mut self) -> Result<A::Output> {
        self.lookahead.next(&mut self.fold)
    }

    fn peek(&mut self) -> Result<&A::Output> {
        self.lookahead.peek(&mut self.fold)
    }

    fn supports_reset(&self) -> bool {
        self.fold.input.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        if !self.supports_reset() {
            return Err(Error::NotSupported("reset"));
        }
        self.lookahead.check_open()?;
        self.fold.input.reset()?;
        self.fold.acc.reset();
        self.lookahead.rewind();
        Ok(())
    }
}
