//! Work queues owned by the clustering operator.

use std::collections::VecDeque;

use seqops_core::cursor::CursorState;
use seqops_core::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Fifo,
    Lifo,
}

/// Buffer with FIFO or LIFO removal and the same open/close lifecycle as a
/// cursor: `enqueue`/`dequeue` fail with `InvalidState` unless opened.
#[derive(Debug)]
pub struct Queue<T> {
    items: VecDeque<T>,
    discipline: Discipline,
    state: CursorState,
}

impl<T> Queue<T> {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            items: VecDeque::new(),
            discipline,
            state: CursorState::Unopened,
        }
    }

    pub fn fifo() -> Self {
        Self::new(Discipline::Fifo)
    }

    pub fn lifo() -> Self {
        Self::new(Discipline::Lifo)
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn open(&mut self) -> Result<()> {
        self.state.open().map(|_| ())
    }

    /// Drops whatever is still buffered.
    pub fn close(&mut self) {
        self.items.clear();
        self.state = CursorState::Closed;
    }

    pub fn enqueue(&mut self, item: T) -> Result<()> {
        self.state.check_open()?;
        self.items.push_back(item);
        Ok(())
    }

    /// `None` once the queue is empty.
    pub fn dequeue(&mut self) -> Result<Option<T>> {
        self.state.check_open()?;
        Ok(match self.discipline {
            Discipline::Fifo => self.items.pop_front(),
            Discipline::Lifo => self.items.pop_back(),
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Buffered items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
