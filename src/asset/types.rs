//! Asset identity and descriptor types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// File extensions treated as images (and therefore thumbnailed).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// File extensions treated as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "ogv", "mov", "avi", "mkv", "m4v"];

/// A forward-slash path relative to the asset root.
///
/// Never contains `.`, `..` or empty segments and never starts with a
/// separator. The empty path denotes the asset root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
    /// The asset root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Build a path from already-validated segments.
    pub(crate) fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let joined = segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Append a single name segment.
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// The containing folder; the root is its own parent.
    pub fn parent(&self) -> Self {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => Self(parent.to_string()),
            None => Self::root(),
        }
    }

    /// The last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(self.0.rsplit('/').next().unwrap_or(&self.0))
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &RelativePath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0 || self.0.starts_with(&format!("{}/", other.0))
    }

    /// The path with host separators, for joining onto a root directory.
    pub fn to_path_buf(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an entry is a folder or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Folder,
    File,
}

/// Content classification derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Unknown,
}

impl MediaType {
    /// Classify a file by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some(e) if IMAGE_EXTENSIONS.contains(&e) => MediaType::Image,
            Some(e) if VIDEO_EXTENSIONS.contains(&e) => MediaType::Video,
            _ => MediaType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Unknown => "unknown",
        }
    }
}

/// A listing entry for one child of a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub name: String,
    pub kind: AssetKind,
    pub relative_path: RelativePath,
    /// Set for files only.
    pub media_type: Option<MediaType>,
    /// Sidecar path relative to the asset root (`thumbs/...`), if one exists.
    pub thumbnail: Option<RelativePath>,
    /// Size in bytes, files only.
    pub size: Option<u64>,
}

/// State of the thumbnail mirror after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorState {
    /// The sidecar tree mirrors the asset tree for the touched path.
    Consistent,
    /// The primary mutation succeeded but the sidecar could not follow.
    Drifted { reason: String },
}

/// Outcome of an asset mutation: the primary result plus the mirror state.
///
/// The primary half is load-bearing; the mirror half is best-effort and a
/// drift never rolls the primary mutation back.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    pub value: T,
    pub mirror: MirrorState,
}

impl<T> Mutation<T> {
    pub fn consistent(value: T) -> Self {
        Self {
            value,
            mirror: MirrorState::Consistent,
        }
    }

    pub fn drifted(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            mirror: MirrorState::Drifted {
                reason: reason.into(),
            },
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.mirror == MirrorState::Consistent
    }
}
