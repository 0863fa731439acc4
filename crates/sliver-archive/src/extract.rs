//! Streaming extraction of a package payload.
//!
//! Entries are visited once, in payload order. Each entry is matched against
//! the exact source paths and the glob keys of the [`TargetSpec`], and every
//! destination it maps to is created under the target directory together with
//! any parent directory still missing. Parents take the mode of their own
//! payload entry when it was already seen, `0755` otherwise; a payload
//! directory showing up after its synthesized stand-in fixes the mode.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sliver_fs::{CreateOptions, Mode, S_IFBLK, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFREG, create};
use sliver_path::{Glob, is_glob, parent_dir};
use tar::EntryType;
use tracing::{debug, trace};

use crate::format::TarCompress;
use crate::options::{CreateEvent, ExtractOptions};
use crate::target::{ExtractInfo, TargetSpec};
use crate::{Error, Result};

/// Extract the selected content of a `.deb` package.
///
/// The data payload member is located in the `ar` container, decompressed
/// and handed to the tar extraction. Every failure is wrapped with the
/// package name.
pub fn extract_package<R: Read>(reader: R, options: &mut ExtractOptions<'_>) -> Result<()> {
    debug!(package = %options.package, "extracting files from package");
    let package = options.package.clone();
    read_package(reader, options).map_err(|source| Error::Package {
        package,
        source: Box::new(source),
    })
}

/// Extract the selected content of a decoded tar payload.
pub fn extract_data<R: Read>(reader: R, options: &mut ExtractOptions<'_>) -> Result<()> {
    Extraction::new(options)?.run(reader)
}

fn read_package<R: Read>(reader: R, options: &mut ExtractOptions<'_>) -> Result<()> {
    let extraction = Extraction::new(options)?;

    let mut container = ar::Archive::new(reader);
    while let Some(member) = container.next_entry() {
        let member = member.map_err(|source| Error::Container { source })?;
        let name = String::from_utf8_lossy(member.header().identifier()).into_owned();
        let Some(codec) = TarCompress::from_member_name(&name) else {
            continue;
        };
        trace!(member = %name, "reading data payload");
        return extraction.run(codec.decoder(member)?);
    }
    Err(Error::NoDataPayload)
}

#[derive(Clone, Copy, Debug, Default)]
struct DirInfo {
    mode: Option<Mode>,
    created: bool,
    explicit: bool,
}

struct Extraction<'o, 'a> {
    options: &'o mut ExtractOptions<'a>,
    spec: TargetSpec,
    globs: Vec<Glob>,
    pending: BTreeSet<String>,
    dirs: HashMap<String, DirInfo>,
}

impl<'o, 'a> Extraction<'o, 'a> {
    fn new(options: &'o mut ExtractOptions<'a>) -> Result<Self> {
        options.spec.validate()?;
        check_target_dir(&options.target_dir)?;

        let mut spec = options.spec.clone();
        let mut globs = Vec::new();
        let mut pending = BTreeSet::new();
        for (source, infos) in options.spec.iter() {
            if infos.iter().any(|info| !info.optional) {
                pending.insert(source.to_owned());
            }
            if is_glob(source) {
                globs.push(Glob::new(source)?);
                continue;
            }
            // Ancestors of optional targets are extracted from their own
            // payload entries when present, without becoming mandatory.
            for info in infos.iter().filter(|info| info.optional) {
                let mut dir = parent_dir(&info.path);
                while dir != "/" {
                    if !spec.contains(dir) {
                        spec.add(dir, ExtractInfo::new(dir).optional(true));
                    }
                    dir = parent_dir(dir);
                }
            }
        }

        Ok(Self {
            options,
            spec,
            globs,
            pending,
            dirs: HashMap::new(),
        })
    }

    fn run<R: Read>(mut self, reader: R) -> Result<()> {
        let mut archive = tar::Archive::new(reader);
        for entry in archive.entries().map_err(|source| Error::Payload { source })? {
            let mut entry = entry.map_err(|source| Error::Payload { source })?;
            self.process(&mut entry)?;
        }
        self.finish()
    }

    fn process<R: Read>(&mut self, entry: &mut tar::Entry<'_, R>) -> Result<()> {
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let Some(source) = name.strip_prefix('.').filter(|rest| rest.len() >= 2 && rest.starts_with('/')) else {
            return Ok(());
        };

        let header = entry.header();
        let permissions = header.mode().map_err(|source| Error::Payload { source })?;
        let mode = entry_mode(header.entry_type(), permissions);
        let link = entry
            .link_name_bytes()
            .map(|link| String::from_utf8_lossy(&link).into_owned());
        let size = entry.size();

        let mut targets: Vec<(String, u32)> = self
            .spec
            .get(source)
            .unwrap_or_default()
            .iter()
            .map(|info| (info.path.clone(), info.mode))
            .collect();
        let globs: Vec<String> = self
            .globs
            .iter()
            .filter(|glob| glob.is_match(source))
            .map(|glob| glob.pattern().to_owned())
            .collect();
        if !globs.is_empty() && !targets.iter().any(|(path, _)| path == source) {
            targets.push((source.to_owned(), 0));
        }

        if targets.is_empty() && mode.is_dir() {
            let info = self.dirs.entry(source.to_owned()).or_default();
            if info.mode != Some(mode) {
                if !(info.created && info.explicit) {
                    info.mode = Some(mode);
                }
                if info.created && !info.explicit {
                    targets.push((source.to_owned(), 0));
                }
            }
        }

        if targets.is_empty() {
            return Ok(());
        }

        self.pending.remove(source);
        for glob in globs {
            self.pending.remove(&glob);
            if let Some(globbed) = self.options.globbed.as_deref_mut() {
                globbed.entry(glob).or_default().push(source.to_owned());
            }
        }

        let mut buffer = None;
        if mode.is_regular() {
            let wants_data = self
                .options
                .hooks
                .as_deref_mut()
                .is_some_and(|hooks| hooks.wants_data(source, size));
            if wants_data || targets.len() > 1 {
                let mut data = Vec::new();
                entry
                    .read_to_end(&mut data)
                    .map_err(|err| Error::ReadContent {
                        path: source.to_owned(),
                        source: err,
                    })?;
                if wants_data {
                    if let Some(hooks) = self.options.hooks.as_deref_mut() {
                        hooks.on_data(source, &data).map_err(Error::Hook)?;
                    }
                }
                buffer = Some(data);
            }
        }

        for (target, permissions) in &targets {
            self.create_parents(target)?;
            let target_mode = mode.with_permissions(*permissions);
            self.notify(CreateEvent {
                source: Some(source),
                target,
                link: link.as_deref(),
                mode: target_mode,
            })?;
            trace!(source, target = %target, mode = %target_mode, "extracting entry");

            let mut create_options = CreateOptions::new(self.host_path(target), target_mode)
                .root(&self.options.target_dir);
            if let Some(link) = &link {
                create_options = create_options.link(link);
            }
            let mut cached;
            let data: &mut dyn Read = match &buffer {
                Some(bytes) => {
                    cached = bytes.as_slice();
                    &mut cached
                }
                None => &mut *entry,
            };
            create(create_options.data(data))?;

            if target_mode.is_dir() {
                self.dirs.insert(
                    target.clone(),
                    DirInfo {
                        mode: Some(target_mode),
                        created: true,
                        explicit: true,
                    },
                );
            }
        }
        Ok(())
    }

    fn create_parents(&mut self, path: &str) -> Result<()> {
        let dir = parent_dir(path);
        if dir == "/" {
            return Ok(());
        }
        let info = self.dirs.get(dir).copied().unwrap_or_default();
        if info.created {
            return Ok(());
        }
        let (mode, source) = match info.mode {
            Some(mode) => (mode, Some(dir)),
            None => (Mode::dir(0o755), None),
        };

        self.create_parents(dir)?;
        self.notify(CreateEvent {
            source,
            target: dir,
            link: None,
            mode,
        })?;
        create(CreateOptions::new(self.host_path(dir), mode).root(&self.options.target_dir))?;
        self.dirs.insert(
            dir.to_owned(),
            DirInfo {
                mode: Some(mode),
                created: true,
                explicit: info.explicit,
            },
        );
        Ok(())
    }

    fn notify(&mut self, event: CreateEvent<'_>) -> Result<()> {
        match self.options.hooks.as_deref_mut() {
            Some(hooks) => hooks.on_create(&event).map_err(Error::Hook),
            None => Ok(()),
        }
    }

    fn host_path(&self, path: &str) -> PathBuf {
        self.options.target_dir.join(path.trim_start_matches('/'))
    }

    fn finish(self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        Err(Error::MissingContent {
            paths: self.pending.into_iter().collect(),
        })
    }
}

fn check_target_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::MissingTargetDir {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(Error::TargetDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn entry_mode(kind: EntryType, permissions: u32) -> Mode {
    let type_bits = match kind {
        EntryType::Directory => S_IFDIR,
        EntryType::Symlink => S_IFLNK,
        EntryType::Fifo => S_IFIFO,
        EntryType::Char => S_IFCHR,
        EntryType::Block => S_IFBLK,
        _ => S_IFREG,
    };
    Mode::new(type_bits | (permissions & 0o7777))
}
