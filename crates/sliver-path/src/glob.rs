//! Shell-style wildcard matching over whole paths.
//!
//! `*` and `**` match any run of characters, separators included, and `?`
//! matches exactly one character. A subject in directory form (trailing
//! separator) only matches a pattern in directory form, and the other way
//! around. Everything else in a pattern is literal.

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Error, Result};

/// A compiled path pattern.
#[derive(Clone, Debug)]
pub struct Glob {
    pattern: String,
    matcher: GlobMatcher,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(&escape_literals(pattern))
            .literal_separator(false)
            .backslash_escape(false)
            .build()
            .map_err(|source| Error::InvalidGlob {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_owned(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, path: &str) -> bool {
        if path.ends_with('/') != self.pattern.ends_with('/') {
            return false;
        }
        self.matcher.is_match(path)
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Glob {}

/// One-shot match of `pattern` against `path`.
///
/// Invalid patterns never match.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    Glob::new(pattern).is_ok_and(|glob| glob.is_match(path))
}

// Only `*` and `?` are wildcards; wrap the other globset metacharacters in
// single-character classes. Runs of `*` collapse into one so globset never
// sees its `**` component syntax, which would let `/**/x` match `/x`.
fn escape_literals(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' if escaped.ends_with('*') => {}
            '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_within_segment() {
        assert!(glob_match("/foo*", "/foo"));
        assert!(glob_match("/foo*", "/fooo"));
        assert!(!glob_match("/foo*", "/fo"));
    }

    #[test]
    fn star_spans_directories() {
        assert!(glob_match("/usr/*", "/usr/lib/libc.so"));
        assert!(glob_match("/a*/b", "/aa/x/b"));
        assert!(glob_match("/**/he*o", "/usr/bin/hello"));
        assert!(!glob_match("/**/he*o", "/usr/bin/help"));
    }

    #[test]
    fn double_star_behaves_like_star() {
        assert!(!glob_match("/**/x", "/x"));
        assert!(glob_match("/**/x", "/a/x"));
        assert!(glob_match("/**/x", "/a/b/x"));
        assert!(glob_match("/usr/**", "/usr/lib/libc.so"));
        assert!(glob_match("/a/**b", "/a/x/yb"));
        assert!(!glob_match("/a/**/b", "/a/b"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(glob_match("/etc/?", "/etc/a"));
        assert!(!glob_match("/etc/?", "/etc/ab"));
        assert!(glob_match("/a?b", "/a/b"));
    }

    #[test]
    fn directory_forms_only_match_directory_patterns() {
        assert!(!glob_match("/foo*", "/foo/"));
        assert!(!glob_match("/foo*", "/fooo/"));
        assert!(glob_match("/foo*/", "/fooo/"));
        assert!(!glob_match("/foo*/", "/fooo"));
    }

    #[test]
    fn brackets_and_braces_are_literal() {
        assert!(glob_match("/x/[a]*", "/x/[a]b"));
        assert!(!glob_match("/x/[a]*", "/x/ab"));
        assert!(glob_match("/x/{a,b}*", "/x/{a,b}c"));
        assert!(glob_match("/x\\*", "/x\\y"));
    }

    #[test]
    fn glob_keeps_pattern() {
        let glob = Glob::new("/usr/lib/*.so*").unwrap();
        assert_eq!(glob.pattern(), "/usr/lib/*.so*");
        assert_eq!(glob, Glob::new("/usr/lib/*.so*").unwrap());
    }
}
