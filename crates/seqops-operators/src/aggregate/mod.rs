//! Incremental aggregation.
//!
//! An [`Accumulator`] folds elements one at a time and can report its running
//! value after every step. [`Aggregator`] turns any accumulator into a lazy
//! operator; [`AggregateGrouper`](crate::group::AggregateGrouper) keeps one
//! accumulator per group.

pub mod aggregator;
pub mod minimator;

pub use aggregator::Aggregator;
pub use minimator::{Extremum, MapEntry, Minimator, SharedEntry};

use std::ops::Add;

pub trait Accumulator<T> {
    type Output;

    fn update(&mut self, value: T);

    /// Running value, `None` while the accumulator has nothing to report.
    fn value(&self) -> Option<Self::Output>;

    /// Back to the freshly constructed state.
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Count {
    n: u64,
}

impl<T> Accumulator<T> for Count {
    type Output = u64;

    fn update(&mut self, _value: T) {
        self.n += 1;
    }

    fn value(&self) -> Option<u64> {
        Some(self.n)
    }

    fn reset(&mut self) {
        self.n = 0;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sum<N> {
    total: Option<N>,
}

impl<N> Default for Sum<N> {
    fn default() -> Self {
        Self { total: None }
    }
}

impl<N: Copy + Add<Output = N>> Accumulator<N> for Sum<N> {
    type Output = N;

    fn update(&mut self, value: N) {
        self.total = Some(match self.total {
            Some(t) => t + value,
            None => value,
        });
    }

    fn value(&self) -> Option<N> {
        self.total
    }

    fn reset(&mut self) {
        self.total = None;
    }
}

/// Arithmetic mean as `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Average {
    sum: f64,
    n: u64,
}

impl<T: Into<f64>> Accumulator<T> for Average {
    type Output = f64;

    fn update(&mut self, value: T) {
        self.sum += value.into();
        self.n += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.n = 0;
    }
}

/// Every element, in encounter order.
#[derive(Debug, Clone)]
pub struct Collect<T> {
    items: Vec<T>,
}

impl<T> Default for Collect<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> Accumulator<T> for Collect<T> {
    type Output = Vec<T>;

    fn update(&mut self, value: T) {
        self.items.push(value);
    }

    fn value(&self) -> Option<Vec<T>> {
        Some(self.items.clone())
    }

    fn reset(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_accumulators() {
        let mut count = Count::default();
        let mut sum = Sum::default();
        let mut avg = Average::default();
        assert_eq!(Accumulator::<i32>::value(&count), Some(0));
        assert_eq!(Accumulator::<i32>::value(&avg), None);

        for v in [2, 4, 9] {
            count.update(v);
            sum.update(v);
            avg.update(v);
        }
        assert_eq!(Accumulator::<i32>::value(&count), Some(3));
        assert_eq!(sum.value(), Some(15));
        assert_eq!(Accumulator::<i32>::value(&avg), Some(5.0));

        Accumulator::<i32>::reset(&mut count);
        sum.reset();
        assert_eq!(Accumulator::<i32>::value(&count), Some(0));
        assert_eq!(sum.value(), None);
    }
}
