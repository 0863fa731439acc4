//! Filesystem creation primitives for extracted entries.
//!
//! Every entry is created with the exact mode it was requested with; the
//! process umask never leaks into the result.

pub use create::{CreateOptions, create};
pub use error::{Error, Result};
pub use mode::{FileType, Mode, S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFMT, S_IFREG};

mod create;
mod error;
mod mode;
