use std::io;
use std::path::PathBuf;

/// Failure reported by an [`ExtractHooks`](crate::ExtractHooks) implementation.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot extract from package {package:?}: {source}")]
    Package { package: String, source: Box<Error> },

    #[error("when using wildcards source and target paths must match: {path}")]
    GlobMismatch { path: String },

    #[error("no target paths for {path}")]
    EmptyTargets { path: String },

    #[error("extraction paths must be absolute and not the root: {path:?}")]
    InvalidPath { path: String },

    #[error("target directory does not exist: '{path}'")]
    MissingTargetDir { path: PathBuf },

    #[error("cannot access target directory '{path}': {source}")]
    TargetDir { path: PathBuf, source: io::Error },

    #[error("no data payload")]
    NoDataPayload,

    #[error("unsupported payload compression: {member}")]
    UnsupportedCompression { member: String },

    #[error("cannot read package container: {source}")]
    Container { source: io::Error },

    #[error("cannot read data payload: {source}")]
    Payload { source: io::Error },

    #[error("cannot read content of {path}: {source}")]
    ReadContent { path: String, source: io::Error },

    #[error("{}", missing_content(.paths))]
    MissingContent { paths: Vec<String> },

    #[error("extraction hook failed: {0}")]
    Hook(#[source] HookError),

    #[error(transparent)]
    Create(#[from] sliver_fs::Error),

    #[error(transparent)]
    Path(#[from] sliver_path::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn missing_content(paths: &[String]) -> String {
    match paths {
        [path] => format!("no content at {path}"),
        _ => format!("no content at:\n- {}", paths.join("\n- ")),
    }
}
