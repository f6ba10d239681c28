use thiserror::Error;

/// Result type local to seqops-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("memory budget exceeded for tag '{tag}': requested {requested} bytes, capacity {capacity}, used {used}")]
    BudgetExceeded {
        tag: &'static str,
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("memory budget error: {0}")]
    Budget(String),
}

impl From<Error> for seqops_core::Error {
    fn from(e: Error) -> Self {
        seqops_core::Error::ResourceLimit(e.to_string())
    }
}
