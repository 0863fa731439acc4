use std::fs;
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::{Error, FileType, Mode, Result};

/// What to create and how.
///
/// The file type comes from `mode`. Regular files take their content from
/// `data` (empty when unset), symlinks require `link`. With `root` set, the
/// path must live below it and is never reached through a symlink.
pub struct CreateOptions<'a> {
    path: PathBuf,
    mode: Mode,
    link: Option<PathBuf>,
    data: Option<&'a mut dyn Read>,
    root: Option<&'a Path>,
}

impl<'a> CreateOptions<'a> {
    pub fn new(path: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            path: path.into(),
            mode,
            link: None,
            data: None,
            root: None,
        }
    }

    pub fn link(mut self, target: impl Into<PathBuf>) -> Self {
        self.link = Some(target.into());
        self
    }

    pub fn data(mut self, data: &'a mut dyn Read) -> Self {
        self.data = Some(data);
        self
    }

    pub fn root(mut self, root: &'a Path) -> Self {
        self.root = Some(root);
        self
    }
}

/// Create a file, directory or symlink with exactly the requested mode.
///
/// Missing parents are created with the process defaults. Directories that
/// already exist are accepted and get their permissions reset, so several
/// extractions may share ancestors. Existing files are truncated, and a
/// symlink already pointing elsewhere is replaced.
pub fn create(options: CreateOptions<'_>) -> Result<()> {
    let CreateOptions {
        path,
        mode,
        link,
        data,
        root,
    } = options;

    if let Some(root) = root {
        // A symlink at the destination itself is only harmless when it is
        // about to be replaced.
        check_symlinks(root, &path, !mode.is_symlink())?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match mode.file_type() {
        Some(FileType::Directory) => create_dir(&path, mode),
        Some(FileType::Regular) => create_file(&path, mode, data),
        Some(FileType::Symlink) => {
            let target = link
                .as_deref()
                .ok_or_else(|| Error::MissingLinkTarget { path: path.clone() })?;
            create_symlink(&path, target)
        }
        None => Err(Error::UnsupportedType { path, mode }),
    }
}

/// Fail when an existing component of `path` below `root` is a symlink.
///
/// The last component is only inspected when `leaf` is set. Walking stops at
/// the first component that does not exist yet.
fn check_symlinks(root: &Path, path: &Path, leaf: bool) -> Result<()> {
    let relative = path.strip_prefix(root).map_err(|_| Error::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    let mut current = root.to_path_buf();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        current.push(component);
        if components.peek().is_none() && !leaf {
            break;
        }
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::SymlinkEscape {
                    path: path.to_path_buf(),
                    link: current,
                });
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok(())
}

fn create_dir(path: &Path, mode: Mode) -> Result<()> {
    trace!(path = %path.display(), %mode, "creating directory");
    match fs::create_dir(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {}
        Err(source) => {
            return Err(Error::CreateDir {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    set_permissions(path, mode)
}

fn create_file(path: &Path, mode: Mode, data: Option<&mut dyn Read>) -> Result<()> {
    trace!(path = %path.display(), %mode, "writing file");
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(write_err)?;
    if let Some(data) = data {
        io::copy(data, &mut file).map_err(write_err)?;
    }
    drop(file);
    set_permissions(path, mode)
}

fn create_symlink(path: &Path, target: &Path) -> Result<()> {
    trace!(path = %path.display(), target = %target.display(), "creating symlink");
    let symlink_err = |source| Error::Symlink {
        path: path.to_path_buf(),
        source,
    };
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            if meta.file_type().is_symlink() && fs::read_link(path).is_ok_and(|old| old == target) {
                return Ok(());
            }
            if meta.is_dir() {
                fs::remove_dir(path).map_err(symlink_err)?;
            } else {
                fs::remove_file(path).map_err(symlink_err)?;
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(symlink_err(source)),
    }
    std::os::unix::fs::symlink(target, path).map_err(symlink_err)
}

fn set_permissions(path: &Path, mode: Mode) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode.permissions())).map_err(|source| {
        Error::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}
