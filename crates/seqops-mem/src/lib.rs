#![forbid(unsafe_code)]
//! seqops-mem: memory budgeting and occupancy tracking.
//!
//! This crate provides the concrete implementation of the *interfaces* in
//! `seqops-core::budget`. Bounded operators (the run generator) reserve their
//! working set here before allocating, and release it through RAII guards.

pub mod error;
pub mod guard;
pub mod tracking;

pub use error::{Error, Result};
pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};
pub use tracking::PeakTracker;
