//! Path selection for package slicing.
//!
//! # Architecture
//!
//! - `path.rs` - Path normalization and prefix helpers
//! - `glob.rs` - Wildcard matching across directory levels
//! - `trie.rs` - Compressed radix trie of selected paths and globs

pub use error::{Error, Result};
pub use glob::{Glob, glob_match};
pub use path::{CleanPath, clean_path, is_glob, longest_common_prefix, parent_dir};
pub use trie::{NodeId, NodeKind, PathNode, PathTrie, TrieHooks};

mod error;
mod glob;
mod path;
mod trie;
