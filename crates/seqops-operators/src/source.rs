//! Leaf cursors over in-memory data.
//!
//! `VecSource` carries every optional capability (reset/update/remove) and is
//! what the grouping operators hand out as nested buckets. `IterSource` wraps
//! an arbitrary iterator and supports none of them.

use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};

/// Cursor over an owned `Vec`, with reset/update/remove support.
#[derive(Debug, Clone)]
pub struct VecSource<T> {
    items: Vec<T>,
    /// Index of the element `next` returns.
    pos: usize,
    /// Index of the element last handed out by `next` or `peek`.
    last: Option<usize>,
    state: CursorState,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            pos: 0,
            last: None,
            state: CursorState::Unopened,
        }
    }

    /// A source that is already open (nested results are handed out opened).
    pub fn opened(items: Vec<T>) -> Self {
        Self {
            state: CursorState::Opened,
            ..Self::new(items)
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T> From<Vec<T>> for VecSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Clone> Cursor for VecSource<T> {
    type Item = T;

    fn open(&mut self) -> Result<()> {
        self.state.open().map(|_| ())
    }

    fn close(&mut self) {
        self.state = CursorState::Closed;
        self.last = None;
    }

    fn state(&self) -> CursorState {
        self.state
    }

    fn has_next(&mut self) -> Result<bool> {
        self.state.check_open()?;
        Ok(self.pos < self.items.len())
    }

    fn next(&mut self) -> Result<T> {
        self.state.check_open()?;
        let item = self.items.get(self.pos).cloned().ok_or(Error::Exhausted)?;
        self.last = Some(self.pos);
        self.pos += 1;
        Ok(item)
    }

    fn peek(&mut self) -> Result<&T> {
        self.state.check_open()?;
        if self.pos >= self.items.len() {
            return Err(Error::Exhausted);
        }
        self.last = Some(self.pos);
        Ok(&self.items[self.pos])
    }

    fn supports_reset(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<()> {
        self.state.check_open()?;
        self.pos = 0;
        self.last = None;
        Ok(())
    }

    fn supports_update(&self) -> bool {
        true
    }

    fn update(&mut self, value: T) -> Result<()> {
        self.state.check_open()?;
        let idx = self
            .last
            .ok_or_else(|| Error::InvalidState("update without a preceding next/peek".into()))?;
        self.items[idx] = value;
        Ok(())
    }

    fn supports_remove(&self) -> bool {
        true
    }

    fn remove(&mut self) -> Result<()> {
        self.state.check_open()?;
        let idx = self
            .last
            .take()
            .ok_or_else(|| Error::InvalidState("remove without a preceding next/peek".into()))?;
        self.items.remove(idx);
        if idx < self.pos {
            self.pos -= 1;
        }
        Ok(())
    }
}

struct Pull<I>(I);

impl<I: Iterator> Fetch for Pull<I> {
    type Item = I::Item;

    fn fetch(&mut self) -> Result<Option<I::Item>> {
        Ok(self.0.next())
    }
}

/// Capability-less cursor over any iterator.
pub struct IterSource<I: Iterator> {
    lookahead: Lookahead<I::Item>,
    iter: Pull<I>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new<S: IntoIterator<IntoIter = I>>(source: S) -> Self {
        Self {
            lookahead: Lookahead::new(),
            iter: Pull(source.into_iter()),
        }
    }
}

impl<I: Iterator> Cursor for IterSource<I> {
    type Item = I::Item;

    fn open(&mut self) -> Result<()> {
        self.lookahead.open().map(|_| ())
    }

    fn close(&mut self) {
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.iter)
    }

    fn next(&mut self) -> Result<I::Item> {
        self.lookahead.next(&mut self.iter)
    }

    fn peek(&mut self) -> Result<&I::Item> {
        self.lookahead.peek(&mut self.iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqops_core::cursor::drain;
    use seqops_core::ErrorKind;

    #[test]
    fn test_remove_after_next_does_not_skip() {
        let mut src = VecSource::new(vec![1, 2, 3, 4]);
        src.open().unwrap();
        assert_eq!(src.next().unwrap(), 1);
        assert_eq!(src.next().unwrap(), 2);
        src.remove().unwrap();
        assert_eq!(src.remove().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(drain(&mut src).unwrap(), vec![3, 4]);
        assert_eq!(src.as_slice(), &[1, 3, 4]);
    }

    #[test]
    fn test_update_after_peek_targets_peeked() {
        let mut src = VecSource::new(vec![1, 2, 3]);
        src.open().unwrap();
        src.next().unwrap();
        assert_eq!(*src.peek().unwrap(), 2);
        src.update(20).unwrap();
        assert_eq!(src.next().unwrap(), 20);
    }

    #[test]
    fn test_reset_keeps_mutations() {
        let mut src = VecSource::new(vec!["a", "b", "c"]);
        src.open().unwrap();
        src.next().unwrap();
        src.remove().unwrap();
        src.reset().unwrap();
        assert_eq!(drain(&mut src).unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_iter_source_has_no_capabilities() {
        let mut src = IterSource::new(0..3);
        src.open().unwrap();
        assert!(!src.supports_reset());
        assert_eq!(src.next().unwrap(), 0);
        assert_eq!(src.update(9).unwrap_err().kind(), ErrorKind::NotSupported);
        assert_eq!(src.remove().unwrap_err().kind(), ErrorKind::NotSupported);
        assert_eq!(src.reset().unwrap_err().kind(), ErrorKind::NotSupported);
        assert_eq!(drain(&mut src).unwrap(), vec![1, 2]);
    }
}
