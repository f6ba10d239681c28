#![forbid(unsafe_code)]
//! seqops-operators: pull-based operators (sort runs, grouping, aggregation,
//! clustering) over the `seqops-core` cursor protocol.
//!
//! Design intent:
//! - Single threaded and synchronous. Laziness means work deferred to the
//!   next pull, never concurrency.
//! - Bounded operators reserve their working set through `seqops-mem`.
//! - Operators that hand out nested cursors share state with them through
//!   `Rc<RefCell<..>>` and reject stale handles with `InvalidState`.
//! - Policies (comparators, key functions, predicates, accumulators) are
//!   generic parameters, never trait objects.

pub mod metrics;
pub mod source;

pub mod aggregate;
pub mod cluster;
pub mod group;
pub mod sort;

pub use aggregate::{Accumulator, Aggregator, Minimator};
pub use cluster::{Classification, DbScan, PointRef, RangeQuery};
pub use group::{AggregateGrouper, HashGrouper, SortBasedGrouper};
pub use sort::{BoundedHeap, ExternalSort, RunGenerator};
pub use source::{IterSource, VecSource};
