use std::collections::BTreeMap;
use std::path::PathBuf;

use sliver_fs::Mode;

use crate::error::HookError;
use crate::target::TargetSpec;

/// Glob pattern to every source path it matched, in payload order.
pub type Globbed = BTreeMap<String, Vec<String>>;

/// A destination about to be materialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateEvent<'a> {
    /// Payload path the entry comes from; `None` for synthesized parents.
    pub source: Option<&'a str>,
    pub target: &'a str,
    pub link: Option<&'a str>,
    pub mode: Mode,
}

/// Observer of an extraction run.
pub trait ExtractHooks {
    /// Whether the content of the regular file `source` should be handed to
    /// [`on_data`](Self::on_data). Requesting it buffers the whole entry.
    fn wants_data(&mut self, _source: &str, _size: u64) -> bool {
        false
    }

    /// Full content of a regular file, called at most once per payload entry.
    fn on_data(&mut self, _source: &str, _data: &[u8]) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before every destination is created, parents included.
    fn on_create(&mut self, _event: &CreateEvent<'_>) -> Result<(), HookError> {
        Ok(())
    }
}

pub struct ExtractOptions<'a> {
    pub(crate) package: String,
    pub(crate) target_dir: PathBuf,
    pub(crate) spec: TargetSpec,
    pub(crate) hooks: Option<&'a mut dyn ExtractHooks>,
    pub(crate) globbed: Option<&'a mut Globbed>,
}

impl<'a> ExtractOptions<'a> {
    pub fn new(package: impl Into<String>, target_dir: impl Into<PathBuf>, spec: TargetSpec) -> Self {
        Self {
            package: package.into(),
            target_dir: target_dir.into(),
            spec,
            hooks: None,
            globbed: None,
        }
    }

    pub fn hooks(mut self, hooks: &'a mut dyn ExtractHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn globbed(mut self, globbed: &'a mut Globbed) -> Self {
        self.globbed = Some(globbed);
        self
    }
}
