use crate::trie::NodeKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path is empty")]
    EmptyPath,

    #[error("double dot paths (../) are not supported: {path}")]
    Backreference { path: String },

    #[error("cannot insert {requested} {path}: {existing} is a {existing_kind}")]
    Conflict {
        path: String,
        requested: NodeKind,
        existing: String,
        existing_kind: NodeKind,
    },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
