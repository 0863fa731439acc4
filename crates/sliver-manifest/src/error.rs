use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

/// Failure reported by a [`ManifestSink`](crate::ManifestSink).
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write path to db: {0}")]
    WritePath(#[source] SinkError),

    #[error("cannot write content to db: {0}")]
    WriteContent(#[source] SinkError),

    #[error("invalid mode {mode:?}: {source}")]
    InvalidMode { mode: String, source: ParseIntError },

    #[error(transparent)]
    Glob(#[from] sliver_path::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
