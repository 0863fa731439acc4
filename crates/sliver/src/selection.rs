//! Merged path selection of a set of slices.
//!
//! Every slice path is inserted into a [`PathTrie`] with a [`Claim`]; the
//! trie hooks collect the claims of each path and, for the directories an
//! insertion passes through, the slices that need them implicitly.

use std::collections::BTreeSet;

use sliver_archive::{ExtractInfo, TargetSpec};
use sliver_path::{PathNode, PathTrie, TrieHooks, clean_path, glob_match, is_glob, parent_dir};

use crate::slice::{PathInfo, Slice};
use crate::{Error, Result};

/// One slice asking for one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub slice: String,
    pub package: String,
    pub info: PathInfo,
}

/// Everything the selected slices say about a path.
#[derive(Clone, Debug, Default)]
pub struct Claims {
    explicit: Vec<Claim>,
    implicit: BTreeSet<String>,
}

impl Claims {
    /// Claims naming this path, in insertion order.
    pub fn explicit(&self) -> &[Claim] {
        &self.explicit
    }

    /// Slices selecting something below this directory.
    pub fn implicit(&self) -> &BTreeSet<String> {
        &self.implicit
    }

    /// The claim every other one agrees with.
    pub fn first(&self) -> Option<&Claim> {
        self.explicit.first()
    }
}

pub struct Selection {
    slices: Vec<Slice>,
    trie: PathTrie<Claims, Claim>,
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("slices", &self.slices)
            .finish_non_exhaustive()
    }
}

impl Selection {
    /// Merge `slices`, rejecting invalid paths and paths produced in two
    /// different ways.
    pub fn new(slices: Vec<Slice>) -> Result<Self> {
        let hooks = TrieHooks::new()
            .on_explicit(|claims: &mut Claims, claim: &Claim| claims.explicit.push(claim.clone()))
            .on_implicit(|claims: &mut Claims, claim: &Claim| {
                claims.implicit.insert(claim.slice.clone());
            });
        let mut trie = PathTrie::with_hooks(hooks);

        for slice in &slices {
            let name = slice.full_name();
            for (path, info) in &slice.contents {
                let claim = Claim {
                    slice: name.clone(),
                    package: slice.package.clone(),
                    info: normalize(&name, path, info)?,
                };
                trie.insert(path, claim).map_err(|source| Error::Select {
                    slice: name.clone(),
                    source,
                })?;
            }
        }

        let selection = Self { slices, trie };
        selection.check_conflicts()?;
        Ok(selection)
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn trie(&self) -> &PathTrie<Claims, Claim> {
        &self.trie
    }

    /// Selected paths and globs with the claims naming them, in path order.
    pub fn paths(&self) -> impl Iterator<Item = (&PathNode<Claims>, &Claims)> {
        self.trie.iter().filter_map(|node| match node.value() {
            Some(claims) if !claims.explicit.is_empty() => Some((node, claims)),
            _ => None,
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.trie.contains(path)
    }

    /// Slices owning `path` directly or through any glob matching it.
    pub fn owners(&self, path: &str) -> BTreeSet<String> {
        let mut owners = BTreeSet::new();
        let exact = self.trie.find(path).filter(|node| !node.is_glob());
        if let Some(claims) = exact.and_then(PathNode::value) {
            owners.extend(claims.explicit.iter().map(|claim| claim.slice.clone()));
        }
        if let Ok(path) = clean_path(path) {
            for (node, claims) in self.paths().filter(|(node, _)| node.is_glob()) {
                if glob_match(node.path(), path.as_str()) {
                    owners.extend(claims.explicit.iter().map(|claim| claim.slice.clone()));
                }
            }
        }
        owners
    }

    /// Packages with at least one selected slice.
    pub fn packages(&self) -> BTreeSet<&str> {
        self.slices.iter().map(|slice| slice.package.as_str()).collect()
    }

    /// What has to be extracted from `package`.
    ///
    /// Copies map their source onto their path. Content synthesized outside
    /// the payload asks for its parent directory as an optional copy, so the
    /// directory keeps the mode the package gives it.
    pub fn target_spec(&self, package: &str) -> TargetSpec {
        let mut spec = TargetSpec::new();
        let mut parents = BTreeSet::new();
        for (node, claims) in self.paths() {
            let Some(claim) = claims.explicit.iter().find(|claim| claim.package == package) else {
                continue;
            };
            let path = node.path();
            match &claim.info {
                PathInfo::Copy {
                    from,
                    mode,
                    optional,
                    ..
                } => {
                    let source = from.as_deref().unwrap_or(path);
                    spec.add(source, ExtractInfo::new(path).mode(*mode).optional(*optional));
                }
                _ => {
                    let parent = parent_dir(path);
                    if parent != "/" {
                        parents.insert(parent.to_owned());
                    }
                }
            }
        }
        for parent in parents {
            let extracted = spec
                .get(&parent)
                .is_some_and(|infos| infos.iter().any(|info| info.path == parent));
            if !extracted {
                spec.add(parent.clone(), ExtractInfo::new(parent).optional(true));
            }
        }
        spec
    }

    fn check_conflicts(&self) -> Result<()> {
        for (node, claims) in self.paths() {
            let Some(first) = claims.first() else {
                continue;
            };
            for claim in &claims.explicit[1..] {
                if claim.package != first.package || claim.info != first.info {
                    return Err(Error::Conflict {
                        path: node.path().to_owned(),
                        first: first.slice.clone(),
                        second: claim.slice.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// Clean copy sources and reject wildcards anywhere but in plain copies.
fn normalize(slice: &str, path: &str, info: &PathInfo) -> Result<PathInfo> {
    let glob_content = || Error::GlobContent {
        slice: slice.to_owned(),
        path: path.to_owned(),
    };
    match info {
        PathInfo::Copy {
            from: None,
            mode: 0,
            mutable: false,
            ..
        } => Ok(info.clone()),
        _ if is_glob(path) => Err(glob_content()),
        PathInfo::Copy {
            from: Some(from), ..
        } if is_glob(from) => Err(glob_content()),
        PathInfo::Copy {
            from: Some(from),
            mode,
            optional,
            mutable,
        } => {
            let from = clean_path(from).map_err(|source| Error::Select {
                slice: slice.to_owned(),
                source,
            })?;
            Ok(PathInfo::Copy {
                from: Some(from.into_string()),
                mode: *mode,
                optional: *optional,
                mutable: *mutable,
            })
        }
        _ => Ok(info.clone()),
    }
}
