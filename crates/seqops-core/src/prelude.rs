//! Convenient re-exports for downstream crates.

pub use crate::budget::{BudgetGuard, MemoryBudget};
pub use crate::config::OperatorConfig;
pub use crate::cursor::{drain, Cursor, CursorState, Fetch, Lookahead};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::id::ClusterId;
pub use crate::order::{reverse, Comparator, Natural, Reverse};
