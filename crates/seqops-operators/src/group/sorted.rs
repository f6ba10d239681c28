//! Lazy grouping of pre-sorted input.
//!
//! Precondition: the boundary predicate never fires inside what should be one
//! logical group. Groups are never buffered. Each [`SortedGroup`] pulls from
//! the shared input only while the predicate stays false, and whatever the
//! caller leaves unread is skipped before the parent produces the next group.
//!
//! A group handle shares the parent's position through an `Rc<RefCell<..>>`
//! and remembers the generation it was created in. Once the parent moves on
//! (or is reset/closed) the generation no longer matches and every operation
//! on the stale handle fails with `InvalidState`.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use seqops_core::cursor::{Cursor, CursorState, Fetch, Lookahead};
use seqops_core::error::{Error, Result};

use crate::group::StartsGroup;

struct GroupState<I: Cursor, P> {
    input: I,
    boundary: P,
    /// Last element consumed from `input`, by a group or by skipping.
    previous: Option<I::Item>,
    /// Generation of the group currently allowed to read.
    live: u64,
    /// A group handle of generation `live` has been handed out.
    in_group: bool,
    /// The live group has not consumed its first element yet.
    at_group_start: bool,
}

impl<I, P> GroupState<I, P>
where
    I: Cursor,
    I::Item: Clone,
    P: StartsGroup<I::Item>,
{
    fn group_has_next(&mut self) -> Result<bool> {
        if !self.input.has_next()? {
            return Ok(false);
        }
        if self.at_group_start {
            return Ok(true);
        }
        let GroupState {
            input,
            boundary,
            previous,
            ..
        } = self;
        let next = input.peek()?;
        Ok(match previous {
            Some(prev) => !boundary.starts_group(prev, next),
            None => true,
        })
    }

    fn group_next(&mut self) -> Result<I::Item> {
        if !self.group_has_next()? {
            return Err(Error::Exhausted);
        }
        let item = self.input.next()?;
        self.previous = Some(item.clone());
        self.at_group_start = false;
        Ok(item)
    }

    /// Consume the rest of the live group without handing it out.
    fn skip_rest(&mut self) -> Result<()> {
        if !self.in_group {
            return Ok(());
        }
        while self.group_has_next()? {
            self.previous = Some(self.input.next()?);
            self.at_group_start = false;
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.live += 1;
        self.in_group = false;
        self.at_group_start = false;
    }
}

/// Producer half of [`SortBasedGrouper`].
struct Groups<I: Cursor, P>(Rc<RefCell<GroupState<I, P>>>);

impl<I, P> Fetch for Groups<I, P>
where
    I: Cursor,
    I::Item: Clone,
    P: StartsGroup<I::Item>,
{
    type Item = SortedGroup<I, P>;

    fn fetch(&mut self) -> Result<Option<SortedGroup<I, P>>> {
        let mut st = self.0.borrow_mut();
        st.skip_rest()?;
        st.invalidate();
        if !st.input.has_next()? {
            return Ok(None);
        }
        st.in_group = true;
        st.at_group_start = true;
        Ok(Some(SortedGroup {
            shared: Rc::clone(&self.0),
            generation: st.live,
            state: CursorState::Opened,
            peeked: None,
            returned: false,
        }))
    }
}

pub struct SortBasedGrouper<I: Cursor, P> {
    lookahead: Lookahead<SortedGroup<I, P>>,
    groups: Groups<I, P>,
}

impl<I, P> SortBasedGrouper<I, P>
where
    I: Cursor,
    I::Item: Clone,
    P: StartsGroup<I::Item>,
{
    /// `boundary(prev, next)` returns true when `next` starts a new group.
    pub fn new(input: I, boundary: P) -> Self {
        Self {
            lookahead: Lookahead::new(),
            groups: Groups(Rc::new(RefCell::new(GroupState {
                input,
                boundary,
                previous: None,
                live: 0,
                in_group: false,
                at_group_start: false,
            }))),
        }
    }
}

impl<I, P> Cursor for SortBasedGrouper<I, P>
where
    I: Cursor,
    I::Item: Clone,
    P: StartsGroup<I::Item>,
{
    type Item = SortedGroup<I, P>;

    fn open(&mut self) -> Result<()> {
        let groups = &self.groups;
        self.lookahead.open_with(|| groups.0.borrow_mut().input.open())
    }

    fn close(&mut self) {
        {
            let mut st = self.groups.0.borrow_mut();
            st.input.close();
            st.previous = None;
            st.invalidate();
        }
        self.lookahead.close();
    }

    fn state(&self) -> CursorState {
        self.lookahead.state()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.lookahead.has_next(&mut self.groups)
    }

    fn next(&mut self) -> Result<Self::Item> {
        self.lookahead.next(&mut self.groups)
    }

    fn peek(&mut self) -> Result<&Self::Item> {
        self.lookahead.peek(&mut self.groups)
    }

    fn supports_reset(&self) -> bool {
        self.groups.0.borrow().input.supports_reset()
    }

    fn reset(&mut self) -> Result<()> {
        if !self.supports_reset() {
            return Err(Error::NotSupported("reset"));
        }
        self.lookahead.check_open()?;
        {
            let mut st = self.groups.0.borrow_mut();
            st.input.reset()?;
            st.previous = None;
            st.invalidate();
        }
        self.lookahead.rewind();
        Ok(())
    }
}

/// One group of a [`SortBasedGrouper`]. Valid until the parent advances.
///
/// `has_next` peeks the shared input to test the boundary, which moves the
/// input's update/remove target, so it also clears this group's target.
pub struct SortedGroup<I: Cursor, P> {
    shared: Rc<RefCell<GroupState<I, P>>>,
    generation: u64,
    state: CursorState,
    peeked: Option<I::Item>,
    /// An element was handed out and the input still points at it.
    returned: bool,
}

impl<I: Cursor, P> SortedGroup<I, P> {
    /// True once the parent has moved past this group.
    pub fn is_stale(&self) -> bool {
        self.shared.borrow().live != self.generation
    }

    fn live(&self) -> Result<RefMut<'_, GroupState<I, P>>> {
        self.state.check_open()?;
        let st = self.shared.borrow_mut();
        if st.live != self.generation {
            return Err(Error::InvalidState(
                "stale group: the parent cursor has advanced past it".into(),
            ));
        }
        Ok(st)
    }
}

impl<I, P> Cursor for SortedGroup<I, P>
where
    I: Cursor,
    I::Item: Clone,
    P: StartsGroup<I::Item>,
{
    type Item = I::Item;

    fn open(&mut self) -> Result<()> {
        self.state.open().map(|_| ())
    }

    fn close(&mut self) {
        self.state = CursorState::Closed;
        self.peeked = None;
        self.returned = false;
    }

    fn state(&self) -> CursorState {
        self.state
    }

    fn has_next(&mut self) -> Result<bool> {
        let has = self.live()?.group_has_next()?;
        // group_has_next may have peeked the input past the returned element
        self.returned = false;
        Ok(has)
    }

    fn next(&mut self) -> Result<I::Item> {
        let item = self.live()?.group_next()?;
        self.peeked = None;
        self.returned = true;
        Ok(item)
    }

    fn peek(&mut self) -> Result<&I::Item> {
        let item = {
            let mut st = self.live()?;
            if !st.group_has_next()? {
                return Err(Error::Exhausted);
            }
            st.input.peek()?.clone()
        };
        self.returned = true;
        Ok(&*self.peeked.insert(item))
    }

    fn supports_update(&self) -> bool {
        self.shared.borrow().input.supports_update()
    }

    fn update(&mut self, value: I::Item) -> Result<()> {
        if !self.supports_update() {
            return Err(Error::NotSupported("update"));
        }
        let returned = self.returned;
        let mut st = self.live()?;
        if !returned {
            return Err(Error::InvalidState(
                "update without a preceding next/peek".into(),
            ));
        }
        st.input.update(value)
    }

    fn supports_remove(&self) -> bool {
        self.shared.borrow().input.supports_remove()
    }

    fn remove(&mut self) -> Result<()> {
        if !self.supports_remove() {
            return Err(Error::NotSupported("remove"));
        }
        {
            let mut st = self.live()?;
            if !self.returned {
                return Err(Error::InvalidState(
                    "remove without a preceding next/peek".into(),
                ));
            }
            st.input.remove()?;
        }
        self.returned = false;
        self.peeked = None;
        Ok(())
    }
}
