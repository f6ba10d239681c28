#![forbid(unsafe_code)]
//! seqops-core: the pull-cursor protocol and the small shared vocabulary
//! (errors, ids, orderings, configs, budget traits) every operator uses.
//!
//! No I/O and no operators live here.

pub mod budget;
pub mod config;
pub mod cursor;
pub mod error;
pub mod id;
pub mod order;
pub mod prelude;

pub use cursor::{Cursor, CursorState};
pub use error::{Error, ErrorKind, Result};
