//! Slice definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named subset of a package's content, plus content it synthesizes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub package: String,
    pub name: String,
    #[serde(default)]
    pub contents: BTreeMap<String, PathInfo>,
}

impl Slice {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            contents: BTreeMap::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>, info: PathInfo) -> Self {
        self.contents.insert(path.into(), info);
        self
    }

    /// `<package>_<name>`, the identity slice owners are recorded under.
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.package, self.name)
    }
}

/// How a selected path is produced. A `mode` of zero means the default for
/// the kind: the payload's own bits for copies, `0644` for text, `0755` for
/// directories and `0777` for symlinks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PathInfo {
    /// Extracted from the package payload, from `from` when set.
    Copy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default)]
        mode: u32,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        mutable: bool,
    },
    Symlink {
        target: String,
        #[serde(default)]
        mode: u32,
    },
    Text {
        data: String,
        #[serde(default)]
        mode: u32,
        #[serde(default)]
        mutable: bool,
    },
    Dir {
        #[serde(default)]
        mode: u32,
    },
}

impl PathInfo {
    /// Plain copy of the same path.
    pub fn copy() -> Self {
        Self::Copy {
            from: None,
            mode: 0,
            optional: false,
            mutable: false,
        }
    }

    pub fn copy_from(from: impl Into<String>) -> Self {
        Self::Copy {
            from: Some(from.into()),
            mode: 0,
            optional: false,
            mutable: false,
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::Text {
            data: data.into(),
            mode: 0,
            mutable: false,
        }
    }

    pub fn symlink(target: impl Into<String>) -> Self {
        Self::Symlink {
            target: target.into(),
            mode: 0,
        }
    }

    pub fn dir() -> Self {
        Self::Dir { mode: 0 }
    }

    pub fn with_mode(mut self, bits: u32) -> Self {
        match &mut self {
            Self::Copy { mode, .. }
            | Self::Symlink { mode, .. }
            | Self::Text { mode, .. }
            | Self::Dir { mode } => *mode = bits,
        }
        self
    }

    /// Mark a copy as optional; other kinds are always produced.
    pub fn optional(mut self) -> Self {
        if let Self::Copy { optional, .. } = &mut self {
            *optional = true;
        }
        self
    }

    /// Allow the content to be rewritten after extraction.
    pub fn mutable(mut self) -> Self {
        if let Self::Copy { mutable, .. } | Self::Text { mutable, .. } = &mut self {
            *mutable = true;
        }
        self
    }

    pub fn is_mutable(&self) -> bool {
        matches!(
            self,
            Self::Copy { mutable: true, .. } | Self::Text { mutable: true, .. }
        )
    }
}
