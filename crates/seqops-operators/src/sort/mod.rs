//! Sorting building blocks: bounded heap, run generation, external merge.

pub mod external;
pub mod heap;
pub mod run;

pub use external::{Descent, ExternalSort};
pub use heap::BoundedHeap;
pub use run::RunGenerator;
