use thiserror::Error;

/// Canonical result for core and every operator built on it.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Static capability: callers can ask `supports_*` before trying.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("cursor exhausted")]
    Exhausted,

    #[error("invalid configuration: {0}")]
    Config(String),

    // The core crate does no accounting itself; `seqops-mem` maps refused
    // reservations into this variant.
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
}

/// Error category without payload, for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidState,
    NotSupported,
    Exhausted,
    Config,
    ResourceLimit,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::Exhausted => ErrorKind::Exhausted,
            Error::Config(_) => ErrorKind::Config,
            Error::ResourceLimit(_) => ErrorKind::ResourceLimit,
        }
    }

    pub(crate) fn not_opened() -> Self {
        Error::InvalidState("cursor not opened".into())
    }

    pub(crate) fn closed() -> Self {
        Error::InvalidState("cursor is closed".into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
