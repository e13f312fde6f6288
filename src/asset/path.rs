//! Sandboxed resolution of client-supplied paths.
//!
//! Every path a client sends is resolved against the asset root. Traversal
//! attempts are not reported as errors: anything that would land outside the
//! root resolves to the root itself.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::types::RelativePath;
use crate::Result;

/// A client path resolved inside the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub absolute: PathBuf,
    pub relative: RelativePath,
}

/// Resolves client paths against a fixed, canonical asset root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`.
    ///
    /// The directory is created if it doesn't exist and canonicalized once, so
    /// later containment checks compare canonical paths.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = fs::canonicalize(&root)?;

        Ok(Self { root })
    }

    /// The canonical asset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client path.
    ///
    /// `..`, `.` and empty segments are dropped, both `/` and `\` count as
    /// separators, and the result falls back to the root when the cleaned path
    /// would still escape it (symlinks included).
    pub fn resolve(&self, client_path: &str) -> ResolvedPath {
        let Some(segments) = clean_segments(client_path) else {
            tracing::debug!(path = client_path, "Rejected client path, using asset root");
            return self.root_path();
        };

        let relative = RelativePath::from_segments(segments);
        let absolute = self.absolute(&relative);

        if !self.is_contained(&absolute) {
            tracing::debug!(path = client_path, "Client path escapes asset root, using asset root");
            return self.root_path();
        }

        ResolvedPath { absolute, relative }
    }

    /// The absolute path of an already-normalized relative path.
    pub fn absolute(&self, relative: &RelativePath) -> PathBuf {
        self.root.join(relative.to_path_buf())
    }

    fn root_path(&self) -> ResolvedPath {
        ResolvedPath {
            absolute: self.root.clone(),
            relative: RelativePath::root(),
        }
    }

    /// Check that the deepest existing ancestor of `candidate` canonicalizes
    /// to a location under the root.
    fn is_contained(&self, candidate: &Path) -> bool {
        let mut ancestor = candidate;
        loop {
            match fs::canonicalize(ancestor) {
                Ok(canonical) => return canonical.starts_with(&self.root),
                Err(_) => {
                    // A dangling symlink exists but cannot be canonicalized.
                    if fs::symlink_metadata(ancestor).is_ok() {
                        return false;
                    }
                }
            }

            match ancestor.parent() {
                Some(parent) => ancestor = parent,
                None => return false,
            }
        }
    }
}

/// Split a client path into clean segments.
///
/// Returns `None` when a segment can't be a plain file name on every host
/// (NUL bytes, `:` drive or stream markers).
fn clean_segments(input: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();

    for segment in input.split(['/', '\\']) {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        if segment.contains(['\0', ':']) {
            return None;
        }

        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => segments.push(segment),
            _ => return None,
        }
    }

    Some(segments)
}
