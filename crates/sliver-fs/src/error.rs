use std::io;
use std::path::PathBuf;

use crate::Mode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot write file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("cannot create symlink '{path}': {source}")]
    Symlink { path: PathBuf, source: io::Error },

    #[error("cannot set permissions on '{path}': {source}")]
    Permissions { path: PathBuf, source: io::Error },

    #[error("symlink '{path}' has no target")]
    MissingLinkTarget { path: PathBuf },

    #[error("'{path}' is not below '{root}'")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("symlink escapes target directory: '{path}' through '{link}'")]
    SymlinkEscape { path: PathBuf, link: PathBuf },

    #[error("unsupported file type {mode} at '{path}'")]
    UnsupportedType { path: PathBuf, mode: Mode },
}

pub type Result<T> = std::result::Result<T, Error>;
