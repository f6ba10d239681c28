//! MemoryBudget + RAII guard implementations.
//!
//! Operators acquire a guard before building bounded state. Dropping the
//! guard returns the bytes to the budget.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use seqops_core::budget::{BudgetGuard, MemoryBudget};
use seqops_core::config::OperatorConfig;

use crate::error::{Error, Result};

/// Shared ledger behind every clone of a budget.
struct Ledger {
    capacity: usize,
    used: AtomicUsize,
}

impl Ledger {
    fn try_take(&self, bytes: usize) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |cur| {
                let next = cur.checked_add(bytes)?;
                (next <= self.capacity).then_some(next)
            })
            .is_ok()
    }

    fn give_back(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Concrete MemoryBudget. Cloning shares the same ledger.
#[derive(Clone)]
pub struct MemoryBudgetImpl {
    ledger: Arc<Ledger>,
}

impl MemoryBudgetImpl {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            ledger: Arc::new(Ledger {
                capacity: capacity_bytes,
                used: AtomicUsize::new(0),
            }),
        }
    }

    pub fn from_config(cfg: &OperatorConfig) -> Self {
        Self::new(cfg.mem_cap_bytes)
    }

    /// Current usage (advisory).
    pub fn used_bytes(&self) -> usize {
        self.ledger.used.load(Ordering::Relaxed)
    }

    pub fn capacity_bytes(&self) -> usize {
        self.ledger.capacity
    }

    /// Like `try_acquire`, but reports why the reservation was refused.
    pub fn reserve(&self, bytes: usize, tag: &'static str) -> Result<BudgetGuardImpl> {
        self.try_acquire(bytes, tag)
            .ok_or_else(|| Error::BudgetExceeded {
                tag,
                requested: bytes,
                capacity: self.capacity_bytes(),
                used: self.used_bytes(),
            })
    }

    /// Reserve room for `count` values of `T`.
    pub fn reserve_elements<T>(&self, count: usize, tag: &'static str) -> Result<BudgetGuardImpl> {
        let bytes = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or_else(|| Error::Budget(format!("{count} elements overflow usize bytes")))?;
        self.reserve(bytes, tag)
    }
}

impl std::fmt::Debug for MemoryBudgetImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBudgetImpl")
            .field("capacity", &self.ledger.capacity)
            .field("used", &self.used_bytes())
            .finish()
    }
}

/// RAII guard that accounts for a number of bytes.
/// Dropping it returns bytes to the budget.
pub struct BudgetGuardImpl {
    ledger: Arc<Ledger>,
    bytes: usize,
    tag: &'static str,
}

impl Drop for BudgetGuardImpl {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.ledger.give_back(self.bytes);
            self.bytes = 0;
        }
    }
}

impl std::fmt::Debug for BudgetGuardImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetGuardImpl")
            .field("bytes", &self.bytes)
            .field("tag", &self.tag)
            .finish()
    }
}

// ----- trait impls -----

impl BudgetGuard for BudgetGuardImpl {
    fn bytes(&self) -> usize {
        self.bytes
    }
    fn tag(&self) -> &'static str {
        self.tag
    }
}

impl MemoryBudget for MemoryBudgetImpl {
    type Guard = BudgetGuardImpl;

    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard> {
        if bytes > 0 && !self.ledger.try_take(bytes) {
            return None;
        }
        Some(BudgetGuardImpl {
            ledger: Arc::clone(&self.ledger),
            bytes,
            tag,
        })
    }

    fn capacity_bytes(&self) -> usize {
        MemoryBudgetImpl::capacity_bytes(self)
    }

    fn used_bytes(&self) -> usize {
        MemoryBudgetImpl::used_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_returns_bytes_on_drop() {
        let budget = MemoryBudgetImpl::new(1024);
        let guard = budget.reserve(600, "test").unwrap();
        assert_eq!(guard.bytes(), 600);
        assert_eq!(budget.used_bytes(), 600);

        assert!(budget.try_acquire(500, "test").is_none());
        drop(guard);
        assert_eq!(budget.used_bytes(), 0);
        assert!(budget.try_acquire(500, "test").is_some());
    }

    #[test]
    fn test_reserve_reports_budget_exceeded() {
        let budget = MemoryBudgetImpl::new(16);
        let err = budget.reserve_elements::<u64>(3, "run_gen").unwrap_err();
        match err {
            Error::BudgetExceeded {
                tag,
                requested,
                capacity,
                ..
            } => {
                assert_eq!(tag, "run_gen");
                assert_eq!(requested, 24);
                assert_eq!(capacity, 16);
            }
            other => panic!("unexpected error: {other}"),
        }

        let core_err: seqops_core::Error = budget.reserve(32, "x").unwrap_err().into();
        assert_eq!(core_err.kind(), seqops_core::ErrorKind::ResourceLimit);
    }

    #[test]
    fn test_reserve_elements_overflow() {
        let budget = MemoryBudgetImpl::new(usize::MAX);
        let err = budget.reserve_elements::<u64>(usize::MAX, "big").unwrap_err();
        assert!(matches!(err, Error::Budget(_)));
    }

    #[test]
    fn test_usage_readable_inherent_and_through_trait() {
        fn through_trait<B: MemoryBudget>(b: &B) -> (usize, usize) {
            (b.used_bytes(), b.capacity_bytes())
        }
        let budget = MemoryBudgetImpl::new(64);
        let _g = budget.reserve(40, "test").unwrap();
        assert_eq!(through_trait(&budget), (40, 64));
        assert_eq!(MemoryBudgetImpl::used_bytes(&budget), 40);
        assert_eq!(MemoryBudgetImpl::capacity_bytes(&budget), 64);
    }
}
