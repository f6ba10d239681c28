//! Pull-cursor protocol shared by every operator.
//!
//! Lifecycle is `Unopened -> Opened -> Closed`. Operators open their upstream
//! cursors from `open`, pull lazily from `has_next`/`next`/`peek`, and release
//! them from `close`. Nothing here is thread-safe: consumption is single
//! threaded and cooperative.
//!
//! Capabilities (`reset`, `update`, `remove`) are static. Callers can ask
//! `supports_*` first; the default implementations fail with
//! [`Error::NotSupported`] and never touch state.

use crate::error::{Error, Result};

/// Cursor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Unopened,
    Opened,
    Closed,
}

impl CursorState {
    pub fn is_open(self) -> bool {
        matches!(self, CursorState::Opened)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, CursorState::Closed)
    }

    /// Ok only while opened.
    pub fn check_open(self) -> Result<()> {
        match self {
            CursorState::Opened => Ok(()),
            CursorState::Unopened => Err(Error::not_opened()),
            CursorState::Closed => Err(Error::closed()),
        }
    }

    /// Transition for `open`. Returns true when the cursor was actually
    /// opened by this call; a second `open` is a no-op.
    pub fn open(&mut self) -> Result<bool> {
        match self {
            CursorState::Unopened => {
                *self = CursorState::Opened;
                Ok(true)
            }
            CursorState::Opened => Ok(false),
            CursorState::Closed => Err(Error::closed()),
        }
    }
}

/// Pull-based sequence.
///
/// Invariants:
/// - `has_next` never moves the logical position, however often it is called.
/// - `peek` returns exactly what the following `next` returns.
/// - `update`/`remove` act on the element most recently handed out by `next`
///   or `peek`, and fail with `InvalidState` when there is none.
/// - A cursor that must peek its own input to answer `has_next` (a nested
///   group of a sort-based grouper, for one) loses that target on `has_next`.
///   Call `update`/`remove` right after `next`/`peek`, before `has_next`.
/// - `close` is safe at any time and propagates to upstream cursors.
pub trait Cursor {
    type Item;

    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    fn state(&self) -> CursorState;

    fn has_next(&mut self) -> Result<bool>;

    fn next(&mut self) -> Result<Self::Item>;

    fn peek(&mut self) -> Result<&Self::Item>;

    fn supports_reset(&self) -> bool {
        false
    }

    /// Rewind to the start. Destructive changes already applied upstream stay.
    fn reset(&mut self) -> Result<()> {
        Err(Error::NotSupported("reset"))
    }

    fn supports_update(&self) -> bool {
        false
    }

    fn update(&mut self, _value: Self::Item) -> Result<()> {
        Err(Error::NotSupported("update"))
    }

    fn supports_remove(&self) -> bool {
        false
    }

    fn remove(&mut self) -> Result<()> {
        Err(Error::NotSupported("remove"))
    }
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn state(&self) -> CursorState {
        (**self).state()
    }

    fn has_next(&mut self) -> Result<bool> {
        (**self).has_next()
    }

    fn next(&mut self) -> Result<Self::Item> {
        (**self).next()
    }

    fn peek(&mut self) -> Result<&Self::Item> {
        (**self).peek()
    }

    fn supports_reset(&self) -> bool {
        (**self).supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn supports_update(&self) -> bool {
        (**self).supports_update()
    }

    fn update(&mut self, value: Self::Item) -> Result<()> {
        (**self).update(value)
    }

    fn supports_remove(&self) -> bool {
        (**self).supports_remove()
    }

    fn remove(&mut self) -> Result<()> {
        (**self).remove()
    }
}

/// Producer side of a lazily evaluated operator: compute the next result, or
/// `None` once the operator is exhausted.
pub trait Fetch {
    type Item;

    fn fetch(&mut self) -> Result<Option<Self::Item>>;
}

/// Lifecycle state plus the one-element peek buffer.
///
/// Operators keep this next to (not inside) their producer state so that
/// `has_next`/`next`/`peek` can borrow both halves at once.
#[derive(Debug)]
pub struct Lookahead<T> {
    state: CursorState,
    slot: Option<T>,
    exhausted: bool,
}

impl<T> Default for Lookahead<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Lookahead<T> {
    pub const fn new() -> Self {
        Self {
            state: CursorState::Unopened,
            slot: None,
            exhausted: false,
        }
    }

    /// A lookahead that starts in `Opened` (used for nested cursors handed
    /// out by a parent operator).
    pub const fn opened() -> Self {
        Self {
            state: CursorState::Opened,
            slot: None,
            exhausted: false,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn check_open(&self) -> Result<()> {
        self.state.check_open()
    }

    /// See [`CursorState::open`].
    pub fn open(&mut self) -> Result<bool> {
        self.state.open()
    }

    /// Run `setup` on the first `open` and only then become `Opened`.
    /// A failed setup leaves the cursor unopened, so the next `open` retries
    /// it instead of succeeding on an empty operator.
    pub fn open_with<F>(&mut self, setup: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        match self.state {
            CursorState::Opened => Ok(()),
            CursorState::Closed => Err(Error::closed()),
            CursorState::Unopened => {
                setup()?;
                self.state = CursorState::Opened;
                Ok(())
            }
        }
    }

    pub fn close(&mut self) {
        self.state = CursorState::Closed;
        self.slot = None;
        self.exhausted = false;
    }

    /// Drop the buffered element and forget exhaustion (used by `reset`).
    pub fn rewind(&mut self) {
        self.slot = None;
        self.exhausted = false;
    }

    pub fn is_buffered(&self) -> bool {
        self.slot.is_some()
    }

    pub fn has_next<F>(&mut self, source: &mut F) -> Result<bool>
    where
        F: Fetch<Item = T> + ?Sized,
    {
        self.check_open()?;
        if self.slot.is_none() && !self.exhausted {
            match source.fetch()? {
                Some(item) => self.slot = Some(item),
                None => self.exhausted = true,
            }
        }
        Ok(self.slot.is_some())
    }

    pub fn next<F>(&mut self, source: &mut F) -> Result<T>
    where
        F: Fetch<Item = T> + ?Sized,
    {
        if !self.has_next(source)? {
            return Err(Error::Exhausted);
        }
        self.slot.take().ok_or(Error::Exhausted)
    }

    pub fn peek<F>(&mut self, source: &mut F) -> Result<&T>
    where
        F: Fetch<Item = T> + ?Sized,
    {
        if !self.has_next(source)? {
            return Err(Error::Exhausted);
        }
        self.slot.as_ref().ok_or(Error::Exhausted)
    }
}

/// Pull every remaining element of an opened cursor into a `Vec`.
pub fn drain<C: Cursor + ?Sized>(cursor: &mut C) -> Result<Vec<C::Item>> {
    let mut out = Vec::new();
    while cursor.has_next()? {
        out.push(cursor.next()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl Fetch for Countdown {
        type Item = u32;

        fn fetch(&mut self) -> Result<Option<u32>> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(self.0))
        }
    }

    #[test]
    fn test_lookahead_requires_open() {
        let mut la = Lookahead::new();
        let mut src = Countdown(2);
        let err = la.has_next(&mut src).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidState);
        assert_eq!(src.0, 2, "nothing pulled before open");
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let mut la = Lookahead::new();
        let mut src = Countdown(2);
        assert!(la.open().unwrap());
        assert!(!la.open().unwrap());

        assert!(la.has_next(&mut src).unwrap());
        assert!(la.has_next(&mut src).unwrap());
        assert_eq!(src.0, 1, "only one element fetched");

        assert_eq!(*la.peek(&mut src).unwrap(), 1);
        assert_eq!(la.next(&mut src).unwrap(), 1);
        assert_eq!(la.next(&mut src).unwrap(), 0);
        assert!(!la.has_next(&mut src).unwrap());
        assert!(matches!(la.next(&mut src), Err(Error::Exhausted)));
    }

    #[test]
    fn test_failed_setup_stays_unopened() {
        let mut la: Lookahead<u32> = Lookahead::new();
        let mut attempts = 0;
        let err = la
            .open_with(|| {
                attempts += 1;
                Err(Error::InvalidArgument("upstream".into()))
            })
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
        assert_eq!(la.state(), CursorState::Unopened);

        la.open_with(|| {
            attempts += 1;
            Ok(())
        })
        .unwrap();
        la.open_with(|| {
            attempts += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(attempts, 2, "setup runs until it succeeds, then never again");
        assert!(la.state().is_open());
    }

    #[test]
    fn test_open_after_close_fails() {
        let mut la: Lookahead<u32> = Lookahead::new();
        la.open().unwrap();
        la.close();
        assert!(la.state().is_closed());
        assert!(la.open().is_err());
    }
}
