//! Compressed radix trie over selection paths.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Edges are
//! keyed by the first character of their label and are kept disjoint by
//! splitting at the longest common prefix, which introduces bridge nodes.
//! Wildcard paths are not descended: the literal part leading up to the first
//! wildcard is inserted as usual and the whole pattern is attached to the node
//! reached there as a glob entry.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use crate::error::{Error, Result};
use crate::glob::Glob;
use crate::path::{CleanPath, clean_path, longest_common_prefix};

const ROOT: NodeId = NodeId(0);

/// Index of a node inside its [`PathTrie`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Fan-out point shared by several children; carries no value.
    Bridge,
    File,
    Directory,
    /// Glob entry, only reachable through wildcard matching.
    Glob,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bridge => "bridge",
            Self::File => "file",
            Self::Directory => "directory",
            Self::Glob => "glob",
        })
    }
}

type Hook<V, A> = Box<dyn Fn(&mut V, &A) + Send + Sync>;

/// Callbacks invoked while inserting.
///
/// `on_explicit` runs whenever an insertion terminates at a node (first time
/// or again), `on_implicit` runs for every directory an insertion passes
/// through. Values start out as `V::default()`.
pub struct TrieHooks<V, A> {
    explicit: Option<Hook<V, A>>,
    implicit: Option<Hook<V, A>>,
}

impl<V, A> Default for TrieHooks<V, A> {
    fn default() -> Self {
        Self {
            explicit: None,
            implicit: None,
        }
    }
}

impl<V, A> TrieHooks<V, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_explicit(mut self, hook: impl Fn(&mut V, &A) + Send + Sync + 'static) -> Self {
        self.explicit = Some(Box::new(hook));
        self
    }

    pub fn on_implicit(mut self, hook: impl Fn(&mut V, &A) + Send + Sync + 'static) -> Self {
        self.implicit = Some(Box::new(hook));
        self
    }

    fn explicit(&self, value: &mut V, arg: &A) {
        if let Some(hook) = &self.explicit {
            hook(value, arg);
        }
    }

    fn implicit(&self, value: &mut V, arg: &A) {
        if let Some(hook) = &self.implicit {
            hook(value, arg);
        }
    }
}

impl<V: Clone> TrieHooks<V, V> {
    /// Hooks that overwrite the node value with the inserted argument.
    pub fn replace() -> Self {
        Self::new()
            .on_explicit(|value: &mut V, arg: &V| *value = arg.clone())
            .on_implicit(|value: &mut V, arg: &V| *value = arg.clone())
    }
}

#[derive(Clone, Debug)]
struct Edge {
    label: String,
    dest: NodeId,
}

#[derive(Clone, Debug)]
pub struct PathNode<V> {
    id: NodeId,
    path: String,
    kind: NodeKind,
    implicit: bool,
    parent: Option<NodeId>,
    value: Option<V>,
    children: BTreeMap<char, Edge>,
    globs: Vec<NodeId>,
    glob: Option<Glob>,
}

impl<V> PathNode<V> {
    fn new(id: NodeId, path: String) -> Self {
        Self {
            id,
            path,
            kind: NodeKind::Bridge,
            implicit: false,
            parent: None,
            value: None,
            children: BTreeMap::new(),
            globs: Vec::new(),
            glob: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Full path up to this node; the pattern itself for glob entries.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn is_glob(&self) -> bool {
        self.kind == NodeKind::Glob
    }

    /// Nearest enclosing directory node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Attached value; `None` only for bridges.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }
}

/// Path selection trie mapping paths and globs to a value of type `V`,
/// updated through [`TrieHooks`] with insertion arguments of type `A`.
pub struct PathTrie<V, A = ()> {
    nodes: Vec<PathNode<V>>,
    hooks: TrieHooks<V, A>,
}

impl<V: Default, A> Default for PathTrie<V, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Default, A> PathTrie<V, A> {
    pub fn new() -> Self {
        Self::with_hooks(TrieHooks::default())
    }

    pub fn with_hooks(hooks: TrieHooks<V, A>) -> Self {
        let mut root = PathNode::new(ROOT, "/".to_owned());
        root.kind = NodeKind::Directory;
        root.implicit = true;
        root.value = Some(V::default());
        Self {
            nodes: vec![root],
            hooks,
        }
    }

    /// Insert a path or glob pattern, returning the node that now holds it.
    ///
    /// A trailing separator requests a directory. Inserting a file where a
    /// directory lives, or the other way around, fails with
    /// [`Error::Conflict`]; nodes visited before the conflict keep the updates
    /// they already received.
    pub fn insert(&mut self, path: &str, arg: A) -> Result<&PathNode<V>> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        let clean = clean_path(path)?;
        let relative = clean.relative();
        let (literal, pattern) = match relative.find(['*', '?']) {
            Some(i) => (&relative[..i], Some(&relative[i..])),
            None => (relative, None),
        };

        let mut node = ROOT;
        let mut dir = ROOT;
        let mut rest = literal;
        while !rest.is_empty() {
            self.pass_through(node, rest, &mut dir, &arg)?;
            let (next, consumed) = self.step(node, rest);
            node = next;
            rest = &rest[consumed..];
        }

        let id = match pattern {
            Some(pattern) => {
                self.pass_through(node, pattern, &mut dir, &arg)?;
                self.add_glob(node, clean.as_str(), dir, &arg)?
            }
            None => {
                self.terminate(node, &clean, dir, &arg)?;
                node
            }
        };
        Ok(&self.nodes[id.0])
    }

    /// Look a path up, falling back to glob entries.
    ///
    /// A path without trailing separator finds files, and directories that
    /// were inserted explicitly. A path with trailing separator finds any
    /// directory, implicit ones included. When no exact node qualifies, the
    /// glob entries hanging off every node on the descent are tried, deepest
    /// first and in insertion order. Invalid paths are never found.
    pub fn find(&self, path: &str) -> Option<&PathNode<V>> {
        let clean = clean_path(path).ok()?;
        let (exact, visited) = self.descend(clean.relative());

        if let Some(id) = exact {
            let node = &self.nodes[id.0];
            let found = match node.kind {
                NodeKind::File => !clean.is_dir(),
                NodeKind::Directory => clean.is_dir(),
                _ => false,
            };
            if found {
                return Some(node);
            }
        }

        if !clean.is_dir() {
            let as_dir = format!("{}/", clean.relative());
            if let (Some(id), _) = self.descend(&as_dir) {
                let node = &self.nodes[id.0];
                if node.kind == NodeKind::Directory && !node.implicit {
                    return Some(node);
                }
            }
        }

        visited.iter().rev().find_map(|id| {
            self.nodes[id.0]
                .globs
                .iter()
                .map(|glob| &self.nodes[glob.0])
                .find(|entry| entry.glob.as_ref().is_some_and(|g| g.is_match(clean.as_str())))
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn root(&self) -> &PathNode<V> {
        &self.nodes[ROOT.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&PathNode<V>> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, node: &PathNode<V>) -> Option<&PathNode<V>> {
        node.parent.map(|id| &self.nodes[id.0])
    }

    /// Every file, directory and glob entry, depth first in label order.
    pub fn iter(&self) -> impl Iterator<Item = &PathNode<V>> {
        let mut order = Vec::new();
        self.collect(ROOT, &mut order);
        order.into_iter().map(|id| &self.nodes[id.0])
    }

    fn collect(&self, id: NodeId, order: &mut Vec<NodeId>) {
        let node = &self.nodes[id.0];
        if node.kind != NodeKind::Bridge {
            order.push(id);
        }
        order.extend(node.globs.iter().copied());
        for edge in node.children.values() {
            self.collect(edge.dest, order);
        }
    }

    fn alloc(&mut self, path: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PathNode::new(id, path));
        id
    }

    // Descend one edge from `node` towards `rest`, splitting or creating
    // edges as needed. New edges stop after the first separator so that
    // every directory ends up with a node of its own. Returns the node
    // reached and how many bytes of `rest` it consumed.
    fn step(&mut self, node: NodeId, rest: &str) -> (NodeId, usize) {
        let Some(first) = rest.chars().next() else {
            return (node, 0);
        };

        let Some(edge) = self.nodes[node.0].children.get(&first).cloned() else {
            let head = match rest.find('/') {
                Some(i) => &rest[..=i],
                None => rest,
            };
            let child = self.alloc(format!("{}{}", self.nodes[node.0].path, head));
            self.nodes[node.0].children.insert(
                first,
                Edge {
                    label: head.to_owned(),
                    dest: child,
                },
            );
            return (child, head.len());
        };

        let (prefix, _, edge_suffix) = longest_common_prefix(rest, &edge.label);
        if edge_suffix.is_empty() {
            return (edge.dest, edge.label.len());
        }

        let bridge = self.alloc(format!("{}{}", self.nodes[node.0].path, prefix));
        let split = edge_suffix.chars().next().unwrap_or(first);
        self.nodes[bridge.0].children.insert(
            split,
            Edge {
                label: edge_suffix.to_owned(),
                dest: edge.dest,
            },
        );
        self.nodes[node.0].children.insert(
            first,
            Edge {
                label: prefix.to_owned(),
                dest: bridge,
            },
        );
        (bridge, prefix.len())
    }

    // An insertion continues past `node` with `rest` still to go.
    fn pass_through(&mut self, node: NodeId, rest: &str, dir: &mut NodeId, arg: &A) -> Result<()> {
        let hooks = &self.hooks;
        let current = &mut self.nodes[node.0];
        match current.kind {
            NodeKind::Directory => {
                hooks.implicit(current.value.get_or_insert_with(V::default), arg);
                *dir = node;
            }
            NodeKind::Bridge if current.path.ends_with('/') => {
                current.kind = NodeKind::Directory;
                current.implicit = true;
                current.parent = Some(*dir);
                hooks.implicit(current.value.insert(V::default()), arg);
                *dir = node;
            }
            NodeKind::File if rest.starts_with('/') => {
                return Err(Error::Conflict {
                    path: format!("{}{}", current.path, rest),
                    requested: NodeKind::Directory,
                    existing: current.path.clone(),
                    existing_kind: NodeKind::File,
                });
            }
            _ => {}
        }
        Ok(())
    }

    // An insertion ends exactly at `node`.
    fn terminate(&mut self, node: NodeId, clean: &CleanPath, dir: NodeId, arg: &A) -> Result<()> {
        let hooks = &self.hooks;
        let current = &mut self.nodes[node.0];
        match current.kind {
            NodeKind::Directory => {
                current.implicit = false;
                hooks.explicit(current.value.get_or_insert_with(V::default), arg);
            }
            NodeKind::File => {
                hooks.explicit(current.value.get_or_insert_with(V::default), arg);
            }
            NodeKind::Bridge if clean.is_dir() => {
                current.kind = NodeKind::Directory;
                current.parent = Some(dir);
                hooks.explicit(current.value.insert(V::default()), arg);
            }
            NodeKind::Bridge => {
                if current.children.contains_key(&'/') {
                    return Err(Error::Conflict {
                        path: clean.to_string(),
                        requested: NodeKind::File,
                        existing: format!("{}/", current.path),
                        existing_kind: NodeKind::Directory,
                    });
                }
                current.kind = NodeKind::File;
                current.parent = Some(dir);
                hooks.explicit(current.value.insert(V::default()), arg);
            }
            NodeKind::Glob => {}
        }
        Ok(())
    }

    fn add_glob(&mut self, node: NodeId, pattern: &str, dir: NodeId, arg: &A) -> Result<NodeId> {
        let existing = self.nodes[node.0]
            .globs
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].path == pattern);
        if let Some(id) = existing {
            let hooks = &self.hooks;
            let entry = &mut self.nodes[id.0];
            hooks.explicit(entry.value.get_or_insert_with(V::default), arg);
            return Ok(id);
        }

        let glob = Glob::new(pattern)?;
        let id = self.alloc(pattern.to_owned());
        let hooks = &self.hooks;
        let entry = &mut self.nodes[id.0];
        entry.kind = NodeKind::Glob;
        entry.parent = Some(dir);
        entry.glob = Some(glob);
        hooks.explicit(entry.value.insert(V::default()), arg);
        self.nodes[node.0].globs.push(id);
        Ok(id)
    }

    // Follow existing edges only. Returns the node matching `relative`
    // exactly, if any, and every node visited on the way.
    fn descend(&self, relative: &str) -> (Option<NodeId>, Vec<NodeId>) {
        let mut visited = vec![ROOT];
        let mut node = ROOT;
        let mut rest = relative;
        loop {
            let Some(first) = rest.chars().next() else {
                return (Some(node), visited);
            };
            let Some(edge) = self.nodes[node.0].children.get(&first) else {
                return (None, visited);
            };
            let Some(suffix) = rest.strip_prefix(edge.label.as_str()) else {
                return (None, visited);
            };
            node = edge.dest;
            rest = suffix;
            visited.push(node);
        }
    }
}

impl<V, A> Index<NodeId> for PathTrie<V, A> {
    type Output = PathNode<V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl<V, A> fmt::Display for PathTrie<V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn dump<V>(
            nodes: &[PathNode<V>],
            id: NodeId,
            depth: usize,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            let node = &nodes[id.0];
            for glob in &node.globs {
                writeln!(f, "{:indent$}G {}", "", nodes[glob.0].path, indent = depth * 4)?;
            }
            for edge in node.children.values() {
                let dest = &nodes[edge.dest.0];
                let marker = match dest.kind {
                    NodeKind::Bridge => '0',
                    NodeKind::Directory if dest.implicit => 'i',
                    NodeKind::Directory => 'd',
                    _ => 'f',
                };
                writeln!(f, "{:indent$}{} <== {:?}", "", marker, edge.label, indent = depth * 4)?;
                dump(nodes, edge.dest, depth + 1, f)?;
            }
            Ok(())
        }
        dump(&self.nodes, ROOT, 0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(paths: &[&str]) -> PathTrie<()> {
        let mut trie = PathTrie::new();
        for path in paths {
            trie.insert(path, ()).unwrap();
        }
        trie
    }

    #[test]
    fn file_insert_creates_implicit_parents() {
        let trie = trie(&["/a/b/c"]);

        assert_eq!(trie.find("/a/b/c").unwrap().kind(), NodeKind::File);
        assert!(trie.contains("/"));
        assert!(trie.contains("/a/"));
        assert!(trie.contains("/a/b/"));
        assert!(!trie.contains("/a/b"));
        assert!(!trie.contains("/a/b/c/"));

        let parent = trie.find("/a/b/").unwrap();
        assert_eq!(parent.kind(), NodeKind::Directory);
        assert!(parent.is_implicit());
    }

    #[test]
    fn explicit_directory_found_without_separator() {
        let trie = trie(&["/a/b/"]);
        let node = trie.find("/a/b").unwrap();
        assert_eq!(node.kind(), NodeKind::Directory);
        assert_eq!(node.path(), "/a/b/");
        assert!(!node.is_implicit());
        assert!(!trie.contains("/a"));
    }

    #[test]
    fn implicit_directory_becomes_explicit() {
        let mut trie = trie(&["/a/b/c"]);
        assert!(!trie.contains("/a/b"));

        let node = trie.insert("/a/b/", ()).unwrap();
        assert!(!node.is_implicit());
        assert!(trie.contains("/a/b"));
    }

    #[test]
    fn empty_lookup_resolves_to_root() {
        let trie = trie(&[]);
        assert!(trie.contains(""));
        assert_eq!(trie.find("./").unwrap().id(), trie.root().id());
    }

    #[test]
    fn file_under_file_conflicts() {
        let mut trie = trie(&["/a/b"]);

        let err = trie.insert("/a/b/c", ()).unwrap_err();
        assert!(
            matches!(
                &err,
                Error::Conflict { path, requested: NodeKind::Directory, existing, existing_kind: NodeKind::File }
                    if path == "/a/b/c" && existing == "/a/b"
            ),
            "{err}"
        );
        assert!(matches!(trie.insert("/a/b/", ()), Err(Error::Conflict { .. })));
        assert!(trie.contains("/a/b"));
        assert!(!trie.contains("/a/b/"));
    }

    #[test]
    fn file_over_directory_conflicts() {
        let mut trie = trie(&["/x/"]);
        let err = trie.insert("/x", ()).unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict { requested: NodeKind::File, existing_kind: NodeKind::Directory, .. }
        ));
        assert!(trie.contains("/x/"));
    }

    #[test]
    fn backreferences_rejected() {
        let mut trie = trie(&[]);
        assert!(matches!(trie.insert("/a/../b", ()), Err(Error::Backreference { .. })));
        assert!(matches!(trie.insert("", ()), Err(Error::EmptyPath)));
        assert!(!trie.contains("/a/../b"));
        assert!(!trie.contains(".."));

        trie.insert("/..foo", ()).unwrap();
        trie.insert("/.foo/", ()).unwrap();
        assert!(trie.contains("/..foo"));
        assert!(trie.contains("/.foo/"));
    }

    #[test]
    fn edges_split_at_common_prefix() {
        let trie = trie(&["/abcd", "/abef"]);

        assert!(trie.contains("/abcd"));
        assert!(trie.contains("/abef"));
        assert!(!trie.contains("/ab"));
        assert!(!trie.contains("/abc"));
        assert_eq!(trie.find("/abef").unwrap().parent(), Some(trie.root().id()));
        assert_eq!(trie.to_string(), "0 <== \"ab\"\n    f <== \"cd\"\n    f <== \"ef\"\n");
    }

    #[test]
    fn multibyte_labels_split_cleanly() {
        let trie = trie(&["/café", "/cafè/"]);
        assert!(trie.contains("/café"));
        assert!(trie.contains("/cafè/"));
        assert!(!trie.contains("/caf"));
    }

    #[test]
    fn parents_skip_bridges() {
        let trie = trie(&["/usr/lib/x86/libc.so", "/usr/libexec/foo"]);

        let mut node = trie.find("/usr/lib/x86/libc.so").unwrap();
        let mut chain = Vec::new();
        while let Some(parent) = trie.parent(node) {
            chain.push(parent.path());
            node = parent;
        }
        assert_eq!(chain, ["/usr/lib/x86/", "/usr/lib/", "/usr/", "/"]);

        let foo = trie.find("/usr/libexec/foo").unwrap();
        let libexec = trie.parent(foo).unwrap();
        assert_eq!(libexec.path(), "/usr/libexec/");
        assert_eq!(trie.parent(libexec).unwrap().path(), "/usr/");
        assert!(trie.contains("/usr/lib/"));
        assert!(!trie.contains("/usr/lib"));
    }

    #[test]
    fn overlapping_globs() {
        let mut trie = trie(&["/fo*", "/foo*"]);

        assert!(trie.contains("/fo"));
        assert!(trie.contains("/foo"));
        assert_eq!(trie.find("/fooo").unwrap().path(), "/foo*");
        assert!(!trie.contains("/foo/"));
        assert!(!trie.contains("/fooo/"));
        assert!(!trie.contains("/f"));

        let first = trie.find("/fooo").unwrap().id();
        assert_eq!(trie.insert("/foo*", ()).unwrap().id(), first);
        assert_eq!(trie.iter().filter(|node| node.is_glob()).count(), 2);
    }

    #[test]
    fn globs_span_directories() {
        let trie = trie(&["/**/he*o", "/usr/lib/*.so*", "/usr/lib/libc.so.6"]);

        assert!(trie.contains("/usr/bin/hello"));
        assert!(!trie.contains("/usr/bin/help"));
        assert!(trie.contains("/usr/lib/x86_64/libm.so.6"));
        assert_eq!(trie.find("/usr/lib/libc.so.6").unwrap().kind(), NodeKind::File);
        assert_eq!(trie.find("/usr/lib/libz.so").unwrap().kind(), NodeKind::Glob);

        let glob = trie.find("/usr/lib/libz.so").unwrap();
        assert_eq!(trie.parent(glob).unwrap().path(), "/usr/lib/");
        assert!(trie.find("/usr/lib/").unwrap().is_implicit());
    }

    #[test]
    fn hooks_see_every_visit() {
        let hooks = TrieHooks::new()
            .on_explicit(|value: &mut Vec<String>, arg: &String| value.push(format!("e:{arg}")))
            .on_implicit(|value: &mut Vec<String>, arg: &String| value.push(format!("i:{arg}")));
        let mut trie = PathTrie::with_hooks(hooks);

        trie.insert("/a/b", "x".to_owned()).unwrap();
        trie.insert("/a/", "y".to_owned()).unwrap();
        trie.insert("/a/*", "p".to_owned()).unwrap();
        trie.insert("/a/*", "q".to_owned()).unwrap();

        let values = |path: &str| trie.find(path).unwrap().value().unwrap().clone();
        assert_eq!(values("/"), ["i:x", "i:y", "i:p", "i:q"]);
        assert_eq!(values("/a/"), ["i:x", "e:y", "i:p", "i:q"]);
        assert_eq!(values("/a/b"), ["e:x"]);
        assert_eq!(values("/a/zzz"), ["e:p", "e:q"]);
    }

    #[test]
    fn replace_hooks_overwrite_values() {
        let mut trie: PathTrie<u32, u32> = PathTrie::with_hooks(TrieHooks::replace());

        trie.insert("/a/b", 1).unwrap();
        assert_eq!(trie.find("/a/").unwrap().value(), Some(&1));

        trie.insert("/a/c", 2).unwrap();
        assert_eq!(trie.find("/a/").unwrap().value(), Some(&2));
        assert_eq!(trie.find("/a/b").unwrap().value(), Some(&1));
        assert_eq!(trie.find("/a/c").unwrap().value(), Some(&2));
    }

    #[test]
    fn iter_skips_bridges_in_path_order() {
        let trie = trie(&["/b", "/a/x", "/a/", "/ab"]);
        let paths: Vec<_> = trie.iter().map(PathNode::path).collect();
        assert_eq!(paths, ["/", "/a/", "/a/x", "/ab", "/b"]);
    }
}
