#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use sliver_archive::{CreateEvent, ExtractHooks, HookError};
use tar::{EntryType, Header};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn target_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("sliver-archive-")
        .tempdir()
        .unwrap()
}

pub fn mode_of(root: &Path, path: &str) -> u32 {
    let meta = fs::symlink_metadata(root.join(path.trim_start_matches('/'))).unwrap();
    meta.permissions().mode() & 0o7777
}

pub fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path.trim_start_matches('/'))).unwrap()
}

pub fn exists(root: &Path, path: &str) -> bool {
    fs::symlink_metadata(root.join(path.trim_start_matches('/'))).is_ok()
}

/// Tar payload with names written verbatim, `./` prefix included.
pub struct Payload {
    builder: tar::Builder<Vec<u8>>,
}

impl Payload {
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    pub fn dir(self, name: &str, mode: u32) -> Self {
        self.entry(name, EntryType::Directory, mode, None, b"")
    }

    pub fn file(self, name: &str, mode: u32, data: &str) -> Self {
        self.entry(name, EntryType::Regular, mode, None, data.as_bytes())
    }

    pub fn symlink(self, name: &str, target: &str) -> Self {
        self.entry(name, EntryType::Symlink, 0o777, Some(target), b"")
    }

    fn entry(mut self, name: &str, kind: EntryType, mode: u32, link: Option<&str>, data: &[u8]) -> Self {
        let mut header = Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(kind);
        header.set_mode(mode);
        header.set_size(data.len() as u64);
        if let Some(link) = link {
            header.set_link_name(link).unwrap();
        }
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}

/// `.deb` container holding `members` after the usual `debian-binary`.
pub fn deb(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut builder = ar::Builder::new(&mut out);
        let mut append = |name: &str, data: &[u8]| {
            let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
            builder.append(&header, data).unwrap();
        };
        append("debian-binary", b"2.0\n");
        for &(name, data) in members {
            append(name, data);
        }
    }
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub source: Option<String>,
    pub target: String,
    pub link: Option<String>,
    pub mode: u32,
}

/// Hooks keeping every observation.
#[derive(Default)]
pub struct Observer {
    pub want_data: bool,
    pub data: Vec<(String, String)>,
    pub created: Vec<Created>,
}

impl ExtractHooks for Observer {
    fn wants_data(&mut self, _source: &str, _size: u64) -> bool {
        self.want_data
    }

    fn on_data(&mut self, source: &str, data: &[u8]) -> Result<(), HookError> {
        self.data
            .push((source.to_owned(), String::from_utf8_lossy(data).into_owned()));
        Ok(())
    }

    fn on_create(&mut self, event: &CreateEvent<'_>) -> Result<(), HookError> {
        self.created.push(Created {
            source: event.source.map(str::to_owned),
            target: event.target.to_owned(),
            link: event.link.map(str::to_owned),
            mode: event.mode.bits(),
        });
        Ok(())
    }
}
