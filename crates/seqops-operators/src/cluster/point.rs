//! Points carrying a mutable cluster assignment.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use seqops_core::id::ClusterId;

/// Assignment state of a point.
///
/// Transitions only move forward: `Unclassified -> Noise`,
/// `Unclassified -> Cluster` and `Noise -> Cluster`. A cluster id is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Unclassified,
    Noise,
    Cluster(ClusterId),
}

impl Classification {
    pub fn is_unclassified(self) -> bool {
        matches!(self, Classification::Unclassified)
    }

    pub fn is_noise(self) -> bool {
        matches!(self, Classification::Noise)
    }

    pub fn cluster_id(self) -> Option<ClusterId> {
        match self {
            Classification::Cluster(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Point<T> {
    value: T,
    class: Cell<Classification>,
}

/// Points are shared between the input, range query results and the
/// clustering queues; the classification is visible through every handle.
pub type PointRef<T> = Rc<Point<T>>;

impl<T> Point<T> {
    pub fn new(value: T) -> PointRef<T> {
        Rc::new(Self {
            value,
            class: Cell::new(Classification::Unclassified),
        })
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn classification(&self) -> Classification {
        self.class.get()
    }

    /// Returns false (and changes nothing) unless the point was unclassified.
    pub(crate) fn mark_noise(&self) -> bool {
        if !self.class.get().is_unclassified() {
            return false;
        }
        self.class.set(Classification::Noise);
        true
    }

    /// Returns false (and changes nothing) if the point already has a cluster.
    pub(crate) fn assign(&self, id: ClusterId) -> bool {
        if self.class.get().cluster_id().is_some() {
            return false;
        }
        self.class.set(Classification::Cluster(id));
        true
    }
}

/// Wrap plain values as unclassified points.
pub fn points<T, I: IntoIterator<Item = T>>(values: I) -> Vec<PointRef<T>> {
    values.into_iter().map(Point::new).collect()
}
