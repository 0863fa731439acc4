#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tar::{EntryType, Header};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn target_dir() -> tempfile::TempDir {
    tempfile::Builder::new().prefix("sliver-").tempdir().unwrap()
}

fn host(root: &Path, path: &str) -> std::path::PathBuf {
    root.join(path.trim_start_matches('/'))
}

pub fn mode_of(root: &Path, path: &str) -> u32 {
    fs::symlink_metadata(host(root, path)).unwrap().permissions().mode() & 0o7777
}

pub fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(host(root, path)).unwrap()
}

pub fn exists(root: &Path, path: &str) -> bool {
    fs::symlink_metadata(host(root, path)).is_ok()
}

pub fn link_of(root: &Path, path: &str) -> String {
    fs::read_link(host(root, path))
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

/// `(name, mode, content)`; names ending in `/` are directories.
pub type Entry<'a> = (&'a str, u32, &'a str);

/// Gzipped `.deb` whose data payload holds `entries`, names kept verbatim.
pub fn deb(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut payload = tar::Builder::new(Vec::new());
    for &(name, mode, content) in entries {
        let mut header = Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        let kind = if name.ends_with('/') {
            EntryType::Directory
        } else {
            EntryType::Regular
        };
        header.set_entry_type(kind);
        header.set_mode(mode);
        header.set_size(content.len() as u64);
        header.set_cksum();
        payload.append(&header, content.as_bytes()).unwrap();
    }
    let payload = payload.into_inner().unwrap();

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&payload).unwrap();
    let data = encoder.finish().unwrap();

    let mut out = Vec::new();
    {
        let mut builder = ar::Builder::new(&mut out);
        for (name, data) in [("debian-binary", b"2.0\n".as_slice()), ("data.tar.gz", data.as_slice())] {
            let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
            builder.append(&header, data).unwrap();
        }
    }
    out
}

pub fn hello_deb() -> Vec<u8> {
    deb(&[
        ("./", 0o755, ""),
        ("./tmp/", 0o1777, ""),
        ("./usr/", 0o755, ""),
        ("./usr/bin/", 0o755, ""),
        ("./usr/bin/hello", 0o775, "hello world\n"),
        ("./usr/share/", 0o755, ""),
        ("./usr/share/doc/", 0o755, ""),
        ("./usr/share/doc/hello/", 0o755, ""),
        ("./usr/share/doc/hello/copyright", 0o644, "copyright\n"),
    ])
}
