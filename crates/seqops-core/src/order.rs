//! Orderings passed to operators at construction.
//!
//! Any `Fn(&T, &T) -> Ordering` is a [`Comparator`]. Descending runs and
//! maximizing aggregates are obtained by wrapping the comparator in
//! [`Reverse`]; operators have no separate "max" code path.

use std::cmp::Ordering;

pub trait Comparator<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// `Ord`-based ascending order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts the wrapped comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse<C>(pub C);

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for Reverse<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

pub fn reverse<C>(cmp: C) -> Reverse<C> {
    Reverse(cmp)
}
