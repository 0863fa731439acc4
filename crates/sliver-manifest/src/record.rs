//! Persisted record shapes.
//!
//! Every record serializes to a JSON object carrying a `kind` field naming
//! its shape. Path modes are octal strings (`"0755"`).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub sha256: String,
    pub arch: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRecord {
    pub name: String,
}

/// One produced filesystem path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PathJson", try_from = "PathJson")]
pub struct PathRecord {
    pub path: String,
    /// Type and permission bits while recording, permission bits only once
    /// completed.
    pub mode: u32,
    pub slices: BTreeSet<String>,
    pub sha256: Option<String>,
    /// Digest after mutation, only when it differs from `sha256`.
    pub final_sha256: Option<String>,
    pub size: u64,
    pub link: Option<String>,
}

/// Ownership of a path by a slice.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentRecord {
    pub slice: String,
    pub path: String,
}

/// Any record, tagged by kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Package(PackageRecord),
    Slice(SliceRecord),
    Path(PathRecord),
    Content(ContentRecord),
}

/// Borrowed form of the records a recorder emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ManifestEntry<'a> {
    Path(&'a PathRecord),
    Content(&'a ContentRecord),
}

#[derive(Serialize, Deserialize)]
struct PathJson {
    path: String,
    mode: String,
    #[serde(default)]
    slices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

impl From<PathRecord> for PathJson {
    fn from(record: PathRecord) -> Self {
        let size = record.sha256.as_ref().map(|_| record.size);
        Self {
            path: record.path,
            mode: format_mode(record.mode),
            slices: record.slices.into_iter().collect(),
            sha256: record.sha256,
            final_sha256: record.final_sha256,
            size,
            link: record.link,
        }
    }
}

impl TryFrom<PathJson> for PathRecord {
    type Error = Error;

    fn try_from(json: PathJson) -> Result<Self, Self::Error> {
        Ok(Self {
            mode: parse_mode(&json.mode)?,
            path: json.path,
            slices: json.slices.into_iter().collect(),
            sha256: json.sha256,
            final_sha256: json.final_sha256,
            size: json.size.unwrap_or_default(),
            link: json.link,
        })
    }
}

/// Octal with a leading zero, `"0"` for no bits at all.
pub fn format_mode(mode: u32) -> String {
    if mode == 0 {
        "0".to_owned()
    } else {
        format!("0{mode:o}")
    }
}

pub fn parse_mode(mode: &str) -> Result<u32, Error> {
    u32::from_str_radix(mode, 8).map_err(|source| Error::InvalidMode {
        mode: mode.to_owned(),
        source,
    })
}
