use sliver_archive::HookError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("slice {slice}: {source}")]
    Select {
        slice: String,
        source: sliver_path::Error,
    },

    #[error("slices {first} and {second} conflict on {path}")]
    Conflict {
        path: String,
        first: String,
        second: String,
    },

    #[error("slice {slice}: wildcard path {path} must be a plain copy")]
    GlobContent { slice: String, path: String },

    #[error("no data for package {package:?}")]
    MissingPackage { package: String },

    #[error("slice {slice}: {source}")]
    Mutate {
        slice: String,
        #[source]
        source: HookError,
    },

    #[error(transparent)]
    Extract(#[from] sliver_archive::Error),

    #[error(transparent)]
    Create(#[from] sliver_fs::Error),

    #[error(transparent)]
    Manifest(#[from] sliver_manifest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
