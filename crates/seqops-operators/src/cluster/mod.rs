//! Density-based clustering.
//!
//! [`DbScan`] pulls points from its input and asks a [`RangeQuery`] for the
//! neighborhood of each one. The range query is the only spatial knowledge
//! the operator has; [`linear_scan`] is a brute-force implementation over an
//! in-memory point set, and [`query_fn`] adapts any closure.

pub mod dbscan;
pub mod point;
pub mod queue;

pub use dbscan::{Cluster, DbScan};
pub use point::{points, Classification, Point, PointRef};
pub use queue::{Discipline, Queue};

use std::marker::PhantomData;
use std::rc::Rc;

use seqops_core::cursor::Cursor;
use seqops_core::error::Result;

use crate::source::VecSource;

/// Ball of radius `eps` around `center`.
#[derive(Debug, Clone, Copy)]
pub struct SearchRegion<'a, T> {
    pub center: &'a T,
    pub eps: f64,
}

/// Neighborhood lookup.
///
/// Returned points must be the same `Rc` handles the clustering input yields,
/// so that classifications are shared. Including the center is allowed; it
/// is never counted as its own neighbor.
pub trait RangeQuery<T> {
    type Neighbors: Cursor<Item = PointRef<T>>;

    fn query(&mut self, region: &SearchRegion<'_, T>) -> Result<Self::Neighbors>;
}

pub struct LinearScan<T, D> {
    points: Vec<PointRef<T>>,
    distance: D,
}

impl<T, D> RangeQuery<T> for LinearScan<T, D>
where
    D: Fn(&T, &T) -> f64,
{
    type Neighbors = VecSource<PointRef<T>>;

    fn query(&mut self, region: &SearchRegion<'_, T>) -> Result<Self::Neighbors> {
        let hits = self
            .points
            .iter()
            .filter(|p| (self.distance)(region.center, p.value()) <= region.eps)
            .map(Rc::clone)
            .collect();
        Ok(VecSource::opened(hits))
    }
}

/// O(n) per query range search over `points`.
pub fn linear_scan<T, D>(points: &[PointRef<T>], distance: D) -> LinearScan<T, D>
where
    D: Fn(&T, &T) -> f64,
{
    LinearScan {
        points: points.to_vec(),
        distance,
    }
}

pub struct QueryFn<F, S> {
    f: F,
    _neighbors: PhantomData<fn() -> S>,
}

impl<T, F, S> RangeQuery<T> for QueryFn<F, S>
where
    F: FnMut(&SearchRegion<'_, T>) -> Result<S>,
    S: Cursor<Item = PointRef<T>>,
{
    type Neighbors = S;

    fn query(&mut self, region: &SearchRegion<'_, T>) -> Result<S> {
        (self.f)(region)
    }
}

pub fn query_fn<T, F, S>(f: F) -> QueryFn<F, S>
where
    F: FnMut(&SearchRegion<'_, T>) -> Result<S>,
    S: Cursor<Item = PointRef<T>>,
{
    QueryFn {
        f,
        _neighbors: PhantomData,
    }
}
