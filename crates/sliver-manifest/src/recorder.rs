//! Bookkeeping of everything an extraction produced.
//!
//! Records are provisional while content is being extracted. The completion
//! pass attaches digests, resolves slice ownership (exact paths and globs),
//! propagates owners up to parent directories and re-hashes mutated files.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use sliver_archive::{CreateEvent, ExtractHooks, HookError};
use sliver_fs::Mode;
use sliver_path::{Glob, parent_dir};
use tracing::{debug, trace};

use crate::record::{ContentRecord, PathRecord};
use crate::sink::ManifestSink;
use crate::{Error, Result};

#[derive(Clone, Debug)]
struct ContentInfo {
    size: u64,
    digest: String,
}

#[derive(Clone, Debug)]
struct GlobOwners {
    glob: Glob,
    slices: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct PathRecorder {
    path_slices: HashMap<String, BTreeSet<String>>,
    glob_slices: BTreeMap<String, GlobOwners>,
    target_to_source: HashMap<String, String>,
    source_content: HashMap<String, ContentInfo>,
    targets: BTreeMap<String, PathRecord>,
    mutated: BTreeSet<String>,
}

/// Lowercase hex SHA-256 of `data`.
pub fn digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `slice` selects `path` exactly.
    pub fn add_slice_path(&mut self, slice: &str, path: &str) {
        self.path_slices
            .entry(path.to_owned())
            .or_default()
            .insert(slice.to_owned());
    }

    /// Record that `slice` selects every path matching `glob`.
    pub fn add_slice_glob(&mut self, slice: &str, glob: &str) -> Result<()> {
        let owners = match self.glob_slices.get_mut(glob) {
            Some(owners) => owners,
            None => self.glob_slices.entry(glob.to_owned()).or_insert(GlobOwners {
                glob: Glob::new(glob)?,
                slices: BTreeSet::new(),
            }),
        };
        owners.slices.insert(slice.to_owned());
        Ok(())
    }

    /// Remember size and digest of a payload entry's content.
    pub fn on_data(&mut self, source: &str, data: &[u8]) {
        self.source_content.insert(
            source.to_owned(),
            ContentInfo {
                size: data.len() as u64,
                digest: digest(data),
            },
        );
    }

    /// Create or replace the record of `target`, produced from `source`.
    pub fn on_create(&mut self, source: Option<&str>, target: &str, link: Option<&str>, mode: Mode) {
        self.targets.insert(
            target.to_owned(),
            PathRecord {
                path: target.to_owned(),
                mode: mode.bits(),
                link: link.map(str::to_owned),
                ..PathRecord::default()
            },
        );
        match source {
            Some(source) => self.target_to_source.insert(target.to_owned(), source.to_owned()),
            None => self.target_to_source.remove(target),
        };
    }

    /// Record content that does not come from a package payload.
    ///
    /// Missing ancestors are recorded as `0755` directories.
    pub fn add_target(&mut self, target: &str, link: Option<&str>, mode: Mode, data: Option<&[u8]>) {
        let mut record = PathRecord {
            path: target.to_owned(),
            mode: mode.bits(),
            link: link.map(str::to_owned),
            ..PathRecord::default()
        };
        if let Some(data) = data {
            record.size = data.len() as u64;
            record.sha256 = Some(digest(data));
        }
        self.targets.insert(target.to_owned(), record);

        let mut parent = parent_dir(target);
        while parent != "/" && !self.targets.contains_key(parent) {
            self.targets.insert(
                parent.to_owned(),
                PathRecord {
                    path: parent.to_owned(),
                    mode: Mode::dir(0o755).bits(),
                    ..PathRecord::default()
                },
            );
            parent = parent_dir(parent);
        }
    }

    /// Flag `target` as rewritten after extraction.
    pub fn mark_mutated(&mut self, target: &str) {
        self.mutated.insert(target.to_owned());
    }

    pub fn remove_target(&mut self, target: &str) {
        self.targets.remove(target);
    }

    pub fn target(&self, path: &str) -> Option<&PathRecord> {
        self.targets.get(path)
    }

    /// Records in path order.
    pub fn targets(&self) -> impl Iterator<Item = &PathRecord> {
        self.targets.values()
    }

    /// Completion pass, run once extraction and mutation are over.
    ///
    /// `root` is the directory content was extracted into; mutated files
    /// are read back from there.
    pub fn update_targets(&mut self, root: &Path) -> Result<()> {
        let paths: Vec<String> = self.targets.keys().cloned().collect();
        for path in &paths {
            self.complete_target(path);
            self.refresh_target(path, root)?;
        }
        debug!(targets = paths.len(), "completed path records");
        Ok(())
    }

    fn complete_target(&mut self, path: &str) {
        let Some(record) = self.targets.get_mut(path) else {
            return;
        };
        record.mode &= 0o7777;
        let content = self
            .target_to_source
            .get(path)
            .and_then(|source| self.source_content.get(source));
        if let Some(content) = content {
            record.size = content.size;
            record.sha256 = Some(content.digest.clone());
        }

        let mut owners = self.path_slices.get(path).cloned().unwrap_or_default();
        for entry in self.glob_slices.values() {
            if entry.glob.is_match(path) {
                owners.extend(entry.slices.iter().cloned());
            }
        }

        // Walk up while some owner is new to the record at hand.
        let mut current = path;
        while !owners.is_empty() && current != "/" {
            let Some(record) = self.targets.get_mut(current) else {
                break;
            };
            owners.retain(|slice| record.slices.insert(slice.clone()));
            current = parent_dir(current);
        }
    }

    fn refresh_target(&mut self, path: &str, root: &Path) -> Result<()> {
        if !self.mutated.contains(path) {
            return Ok(());
        }
        let Some(record) = self.targets.get_mut(path) else {
            return Ok(());
        };
        let Some(initial) = &record.sha256 else {
            return Ok(());
        };

        let local = root.join(path.trim_start_matches('/'));
        let data = fs::read(&local).map_err(|source| Error::Read {
            path: local.clone(),
            source,
        })?;
        let current = digest(&data);
        if current != *initial {
            trace!(path, "content changed by mutation");
            record.final_sha256 = Some(current);
        }
        Ok(())
    }

    /// Emit every record, in path order, followed by its ownership entries.
    ///
    /// The first sink failure stops the emission.
    pub fn update_db<S: ManifestSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        for record in self.targets.values() {
            sink.write_path(record).map_err(Error::WritePath)?;
            for slice in &record.slices {
                let content = ContentRecord {
                    slice: slice.clone(),
                    path: record.path.clone(),
                };
                sink.write_content(&content).map_err(Error::WriteContent)?;
            }
        }
        Ok(())
    }
}

impl ExtractHooks for PathRecorder {
    fn wants_data(&mut self, _source: &str, _size: u64) -> bool {
        true
    }

    fn on_data(&mut self, source: &str, data: &[u8]) -> std::result::Result<(), HookError> {
        PathRecorder::on_data(self, source, data);
        Ok(())
    }

    fn on_create(&mut self, event: &CreateEvent<'_>) -> std::result::Result<(), HookError> {
        PathRecorder::on_create(self, event.source, event.target, event.link, event.mode);
        Ok(())
    }
}
