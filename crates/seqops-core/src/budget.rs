//! Abstract memory budget interfaces.
//!
//! The concrete implementation lives in `seqops-mem`. Only the traits live
//! here so the cursor layer can name them without pulling in accounting.

/// A guard returned by a memory budget when bytes are acquired.
///
/// It must be RAII: the bytes go back to the budget on Drop.
pub trait BudgetGuard {
    /// Number of bytes currently accounted for by this guard.
    fn bytes(&self) -> usize;
    /// Debug tag naming the reservation owner.
    fn tag(&self) -> &'static str {
        "guard"
    }
}

/// A handle representing a memory-cap enforcer.
///
/// Operators call `try_acquire` before building bounded in-memory state. If
/// `None` is returned the operator must refuse to open.
pub trait MemoryBudget {
    type Guard: BudgetGuard;

    /// Attempt to acquire `bytes` from the live budget. Returns a guard on success.
    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard>;

    /// Total configured capacity (bytes).
    fn capacity_bytes(&self) -> usize;

    /// Approximate currently used bytes (advisory; not a correctness API).
    fn used_bytes(&self) -> usize;
}

// NOTE: Do *not* add default impls here that would silently "allow" allocations.
// The mem crate is the only place where guards should be constructed.
