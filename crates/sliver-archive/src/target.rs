//! Mapping from payload source paths to destination entries.

use std::collections::BTreeMap;

use sliver_path::is_glob;

use crate::{Error, Result};

/// One destination for a source path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractInfo {
    pub path: String,
    /// Permission bits replacing the source ones; zero keeps the source bits.
    pub mode: u32,
    /// Optional targets do not fail the extraction when absent.
    pub optional: bool,
}

impl ExtractInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// Source path (or glob) to the destinations it produces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetSpec {
    entries: BTreeMap<String, Vec<ExtractInfo>>,
}

impl TargetSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a destination for `source`; several destinations replicate the
    /// same content.
    pub fn add(&mut self, source: impl Into<String>, info: ExtractInfo) -> &mut Self {
        self.entries.entry(source.into()).or_default().push(info);
        self
    }

    /// Select `source` for extraction at the same path.
    pub fn same(&mut self, source: impl Into<String>) -> &mut Self {
        let source = source.into();
        let info = ExtractInfo::new(source.clone());
        self.add(source, info)
    }

    pub fn get(&self, source: &str) -> Option<&[ExtractInfo]> {
        self.entries.get(source).map(Vec::as_slice)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExtractInfo])> {
        self.entries
            .iter()
            .map(|(source, infos)| (source.as_str(), infos.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the mapping before any payload byte is read.
    ///
    /// Paths must be absolute and not the root, every source needs at least
    /// one destination, and a glob may only be extracted onto itself without
    /// a mode override.
    pub fn validate(&self) -> Result<()> {
        for (source, infos) in &self.entries {
            check_path(source)?;
            if infos.is_empty() {
                return Err(Error::EmptyTargets {
                    path: source.clone(),
                });
            }
            if is_glob(source) {
                if let [info] = infos.as_slice() {
                    if info.path == *source && info.mode == 0 {
                        continue;
                    }
                }
                return Err(Error::GlobMismatch {
                    path: source.clone(),
                });
            }
            for info in infos {
                check_path(&info.path)?;
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, ExtractInfo)> for TargetSpec {
    fn from_iter<I: IntoIterator<Item = (String, ExtractInfo)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (source, info) in iter {
            spec.add(source, info);
        }
        spec
    }
}

fn check_path(path: &str) -> Result<()> {
    if !path.starts_with('/') || path == "/" {
        return Err(Error::InvalidPath {
            path: path.to_owned(),
        });
    }
    Ok(())
}
