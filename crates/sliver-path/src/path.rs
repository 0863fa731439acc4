//! Path normalization shared by the selection trie and the extraction engine.

use std::fmt;

use crate::error::{Error, Result};

/// A normalized absolute path.
///
/// Directories keep their trailing separator, files never carry one and the
/// root is always `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CleanPath {
    path: String,
}

impl CleanPath {
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.path.ends_with('/')
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// The path without its leading separator, as walked by the trie.
    pub fn relative(&self) -> &str {
        &self.path[1..]
    }

    pub fn into_string(self) -> String {
        self.path
    }
}

impl fmt::Display for CleanPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for CleanPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

/// Normalize a selection path.
///
/// Empty and `.` segments are dropped, a `..` segment anywhere is rejected.
/// The result is a directory when the input ends with a separator or a `.`
/// segment, or when nothing but separators and dots remain (the root).
pub fn clean_path(path: &str) -> Result<CleanPath> {
    let mut clean = String::with_capacity(path.len() + 2);
    clean.push('/');
    let mut dir = false;

    for segment in path.split('/') {
        match segment {
            "" | "." => dir = true,
            ".." => {
                return Err(Error::Backreference {
                    path: path.to_owned(),
                });
            }
            name => {
                if clean.len() > 1 {
                    clean.push('/');
                }
                clean.push_str(name);
                dir = false;
            }
        }
    }

    if dir && clean.len() > 1 {
        clean.push('/');
    }
    Ok(CleanPath { path: clean })
}

/// Split two strings at their longest common prefix.
///
/// Returns `(prefix, a_suffix, b_suffix)`. The split always falls on a
/// character boundary.
pub fn longest_common_prefix<'a, 'b>(a: &'a str, b: &'b str) -> (&'a str, &'a str, &'b str) {
    let len = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i);
    (&a[..len], &a[len..], &b[len..])
}

/// The directory holding `path`, with a trailing separator.
///
/// `/a/b/c` and `/a/b/c/` both give `/a/b/`; the root is its own parent.
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(i) => &path[..=i],
        None => "/",
    }
}

/// Whether a path carries a wildcard and must be matched as a glob.
pub fn is_glob(path: &str) -> bool {
    path.contains(['*', '?'])
}
