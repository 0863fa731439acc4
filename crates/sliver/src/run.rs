//! Selection, extraction and recording in one pass.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sliver_archive::{ExtractOptions, Globbed, HookError, extract_package};
use sliver_fs::{CreateOptions, Mode, create};
use sliver_manifest::PathRecorder;
use sliver_path::parent_dir;
use tracing::{debug, trace};

use crate::selection::Selection;
use crate::slice::{PathInfo, Slice};
use crate::{Error, Result};

/// What a [`Mutator`] gets to see of one slice.
pub struct MutateContext<'a> {
    pub slice: &'a Slice,
    /// Directory the content was extracted into.
    pub root: &'a Path,
    /// Selected paths of the slice, glob matches included.
    pub selected: &'a BTreeSet<String>,
    /// Paths the slice declared mutable.
    pub mutable: &'a BTreeSet<String>,
}

/// Rewrites extracted content once every package is in place.
pub trait Mutator {
    fn mutate(&mut self, context: &MutateContext<'_>) -> std::result::Result<(), HookError>;
}

impl<F> Mutator for F
where
    F: FnMut(&MutateContext<'_>) -> std::result::Result<(), HookError>,
{
    fn mutate(&mut self, context: &MutateContext<'_>) -> std::result::Result<(), HookError> {
        self(context)
    }
}

pub struct RunOptions<'a> {
    target_dir: PathBuf,
    slices: Vec<Slice>,
    packages: BTreeMap<String, Box<dyn Read + 'a>>,
    mutator: Option<&'a mut dyn Mutator>,
}

impl<'a> RunOptions<'a> {
    pub fn new(target_dir: impl Into<PathBuf>, slices: Vec<Slice>) -> Self {
        Self {
            target_dir: target_dir.into(),
            slices,
            packages: BTreeMap::new(),
            mutator: None,
        }
    }

    /// Provide the `.deb` data of `name`.
    pub fn package(mut self, name: impl Into<String>, reader: impl Read + 'a) -> Self {
        self.packages.insert(name.into(), Box::new(reader));
        self
    }

    pub fn mutator(mut self, mutator: &'a mut dyn Mutator) -> Self {
        self.mutator = Some(mutator);
        self
    }
}

/// Produce the content of the selected slices under the target directory.
///
/// Packages are extracted in name order, then content defined by the slices
/// themselves is created, then the mutator runs for every slice declaring
/// mutable paths. The returned recorder is complete and ready to be written
/// out with [`PathRecorder::update_db`].
pub fn run(options: RunOptions<'_>) -> Result<PathRecorder> {
    let RunOptions {
        target_dir,
        slices,
        mut packages,
        mut mutator,
    } = options;

    let selection = Selection::new(slices)?;
    let mut recorder = PathRecorder::new();
    for (node, claims) in selection.paths() {
        for claim in claims.explicit() {
            if node.is_glob() {
                recorder.add_slice_glob(&claim.slice, node.path())?;
            } else {
                recorder.add_slice_path(&claim.slice, node.path());
            }
        }
    }

    let mut globbed = Globbed::new();
    for package in selection.packages() {
        let reader = packages
            .remove(package)
            .ok_or_else(|| Error::MissingPackage {
                package: package.to_owned(),
            })?;
        let spec = selection.target_spec(package);
        debug!(package, targets = spec.len(), "slicing package");
        let mut extract = ExtractOptions::new(package, &target_dir, spec)
            .hooks(&mut recorder)
            .globbed(&mut globbed);
        extract_package(reader, &mut extract)?;
    }

    create_content(&selection, &target_dir, &mut recorder)?;

    let mut mutable_paths = BTreeMap::<String, BTreeSet<String>>::new();
    let mut selected_paths = BTreeMap::<String, BTreeSet<String>>::new();
    for (node, claims) in selection.paths() {
        for claim in claims.explicit() {
            let selected = selected_paths.entry(claim.slice.clone()).or_default();
            if !node.is_glob() {
                selected.insert(node.path().to_owned());
            } else if let Some(matches) = globbed.get(node.path()) {
                selected.extend(matches.iter().cloned());
            }
            if claim.info.is_mutable() {
                recorder.mark_mutated(node.path());
                mutable_paths
                    .entry(claim.slice.clone())
                    .or_default()
                    .insert(node.path().to_owned());
            }
        }
    }

    if let Some(mutator) = mutator.as_deref_mut() {
        let none = BTreeSet::new();
        for slice in selection.slices() {
            let name = slice.full_name();
            let Some(mutable) = mutable_paths.get(&name) else {
                continue;
            };
            debug!(slice = %name, paths = mutable.len(), "mutating slice content");
            let context = MutateContext {
                slice,
                root: &target_dir,
                selected: selected_paths.get(&name).unwrap_or(&none),
                mutable,
            };
            mutator
                .mutate(&context)
                .map_err(|source| Error::Mutate { slice: name, source })?;
        }
    }

    recorder.update_targets(&target_dir)?;
    Ok(recorder)
}

// Text, symlinks and directories defined by the slices themselves.
fn create_content(selection: &Selection, root: &Path, recorder: &mut PathRecorder) -> Result<()> {
    for (node, claims) in selection.paths() {
        let Some(claim) = claims.first() else {
            continue;
        };
        let path = node.path();
        let (mode, link, data) = match &claim.info {
            PathInfo::Copy { .. } => continue,
            PathInfo::Text { data, mode, .. } => {
                (Mode::file(or_default(*mode, 0o644)), None, Some(data.as_bytes()))
            }
            PathInfo::Symlink { target, mode } => {
                (Mode::symlink(or_default(*mode, 0o777)), Some(target.as_str()), None)
            }
            PathInfo::Dir { mode } => (Mode::dir(or_default(*mode, 0o755)), None, None),
        };
        trace!(path, mode = %mode, "creating slice content");

        create_parents(root, path)?;
        let mut options = CreateOptions::new(host_path(root, path), mode).root(root);
        if let Some(link) = link {
            options = options.link(link);
        }
        let mut content = data.unwrap_or_default();
        create(options.data(&mut content))?;
        recorder.add_target(path, link, mode, data);
    }
    Ok(())
}

// Missing ancestors get 0755; existing ones keep what extraction gave them.
fn create_parents(root: &Path, path: &str) -> Result<()> {
    let mut missing = Vec::new();
    let mut dir = parent_dir(path);
    while dir != "/" && fs::symlink_metadata(host_path(root, dir)).is_err() {
        missing.push(dir);
        dir = parent_dir(dir);
    }
    for dir in missing.into_iter().rev() {
        create(CreateOptions::new(host_path(root, dir), Mode::dir(0o755)).root(root))?;
    }
    Ok(())
}

fn host_path(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

fn or_default(mode: u32, default: u32) -> u32 {
    if mode == 0 { default } else { mode }
}
