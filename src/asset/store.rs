//! Asset operations over the primary tree and its thumbnail mirror.
//!
//! Every mutation resolves its paths first, performs the primary mutation and
//! then applies the matching change to the sidecar tree. Sidecar failures are
//! reported through [`MirrorState::Drifted`] and never undo the primary
//! mutation.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::path::{PathResolver, ResolvedPath};
use super::thumbnail::{ThumbnailEngine, THUMBS_DIR};
use super::types::{AssetEntry, AssetKind, MediaType, Mutation, RelativePath};
use crate::config::AssetsConfig;
use crate::{MediaError, Result};

/// Upper bound for `name (copy N)` probing.
pub const MAX_COPY_ATTEMPTS: u32 = 10_000;

/// Filesystem-backed asset store.
#[derive(Debug, Clone)]
pub struct AssetStore {
    resolver: PathResolver,
    thumbnails: ThumbnailEngine,
}

impl AssetStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let resolver = PathResolver::new(root)?;
        let thumbnails = ThumbnailEngine::new(resolver.root());

        Ok(Self {
            resolver,
            thumbnails,
        })
    }

    /// Create a store from the assets configuration.
    pub fn from_config(config: &AssetsConfig) -> Result<Self> {
        Self::new(config.root_path())
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn thumbnails(&self) -> &ThumbnailEngine {
        &self.thumbnails
    }

    /// List the immediate children of `folder`.
    ///
    /// Folders come before files, each group ordered by name. The `thumbs`
    /// directory is hidden at the root level and symlinks are skipped.
    pub fn list(&self, folder: &str) -> Result<Vec<AssetEntry>> {
        let folder = self.resolver.resolve(folder);
        if !folder.absolute.is_dir() {
            return Err(MediaError::NotFound(describe(&folder.relative)));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&folder.absolute)? {
            let Some(entry) = skip_vanished(entry)? else {
                continue;
            };
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if folder.relative.is_root() && name == THUMBS_DIR {
                continue;
            }

            // A sibling may be deleted while we list.
            let Some(metadata) = skip_vanished(entry.metadata())? else {
                continue;
            };
            let relative = folder.relative.join(&name);

            if metadata.is_dir() {
                entries.push(AssetEntry {
                    name,
                    kind: AssetKind::Folder,
                    relative_path: relative,
                    media_type: None,
                    thumbnail: None,
                    size: None,
                });
            } else if metadata.is_file() {
                let thumbnail = self
                    .thumbnails
                    .thumbnail_path(&relative)
                    .is_file()
                    .then(|| ThumbnailEngine::thumbnail_ref(&relative));

                entries.push(AssetEntry {
                    media_type: Some(MediaType::from_path(Path::new(&name))),
                    name,
                    kind: AssetKind::File,
                    relative_path: relative,
                    thumbnail,
                    size: Some(metadata.len()),
                });
            }
        }

        entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Delete a file or folder (recursively) and its sidecar.
    ///
    /// Deleting a missing path succeeds; the returned value tells whether
    /// anything was removed from the primary tree.
    pub fn delete(&self, path: &str) -> Result<Mutation<bool>> {
        let target = self.resolver.resolve(path);
        ensure_managed(&target, "delete")?;

        let removed = remove_entry(&target.absolute)?;
        if removed {
            tracing::info!(path = %target.relative, "Deleted asset");
        } else {
            tracing::debug!(path = %target.relative, "Delete of missing asset");
        }

        let sidecar = self.thumbnails.thumbnail_path(&target.relative);
        Ok(match remove_entry(&sidecar) {
            Ok(_) => Mutation::consistent(removed),
            Err(e) => drift(removed, &target.relative, "remove thumbnail", e),
        })
    }

    /// Create a folder named `name` under `parent`.
    ///
    /// The name is reduced to `[a-zA-Z0-9-_]`, other characters become `-`.
    /// Missing ancestors are created too.
    pub fn create_folder(&self, name: &str, parent: &str) -> Result<Mutation<RelativePath>> {
        let name = sanitize_folder_name(name.trim());
        if name.is_empty() {
            return Err(MediaError::Validation("folder name is empty".to_string()));
        }

        let parent = self.resolver.resolve(parent);
        let relative = parent.relative.join(&name);
        ensure_not_reserved(&relative)?;

        fs::create_dir_all(parent.absolute.join(&name))?;
        tracing::info!(path = %relative, "Created folder");

        Ok(Mutation::consistent(relative))
    }

    /// Rename an asset within its parent folder.
    pub fn rename(&self, old_path: &str, new_name: &str) -> Result<Mutation<RelativePath>> {
        let new_name = validate_item_name(new_name)?;
        let source = self.resolver.resolve(old_path);
        ensure_managed(&source, "rename")?;
        ensure_exists(&source)?;

        let destination = source.relative.parent().join(new_name);
        ensure_not_reserved(&destination)?;
        let destination_abs = self.resolver.absolute(&destination);
        if exists(&destination_abs) {
            return Err(MediaError::NameConflict(destination.to_string()));
        }

        fs::rename(&source.absolute, &destination_abs)?;
        tracing::info!(from = %source.relative, to = %destination, "Renamed asset");

        Ok(match self.move_sidecar(&source.relative, &destination) {
            Ok(()) => Mutation::consistent(destination),
            Err(e) => drift(destination, &source.relative, "rename thumbnail", e),
        })
    }

    /// Copy an asset into `new_folder`.
    ///
    /// On a name collision the copy is called `name (copy).ext`, then
    /// `name (copy 2).ext` and so on; an existing entry is never overwritten.
    /// An empty `item_name` keeps the source name.
    pub fn copy(
        &self,
        item_name: &str,
        old_path: &str,
        new_folder: &str,
    ) -> Result<Mutation<RelativePath>> {
        let source = self.resolver.resolve(old_path);
        ensure_managed(&source, "copy")?;
        let is_dir = ensure_exists(&source)?;

        let folder = self.resolve_destination_folder(new_folder)?;
        let item_name = item_name_or_source(item_name, &source)?;
        if is_dir && folder.relative.starts_with(&source.relative) {
            return Err(MediaError::Validation(
                "cannot copy a folder into itself".to_string(),
            ));
        }

        let final_name = free_copy_name(&folder.absolute, &item_name, is_dir)?;
        let destination = folder.relative.join(&final_name);
        ensure_not_reserved(&destination)?;

        copy_entry(&source.absolute, &folder.absolute.join(&final_name))?;
        tracing::info!(from = %source.relative, to = %destination, "Copied asset");

        Ok(match self.copy_sidecar(&source.relative, &destination) {
            Ok(()) => Mutation::consistent(destination),
            Err(e) => drift(destination, &source.relative, "copy thumbnail", e),
        })
    }

    /// Move an asset to `new_folder/item_name`.
    ///
    /// Moving onto the source itself is a no-op. An existing destination is
    /// rejected before anything is touched. A stale sidecar at the destination
    /// is replaced.
    pub fn move_item(
        &self,
        item_name: &str,
        old_path: &str,
        new_folder: &str,
    ) -> Result<Mutation<RelativePath>> {
        let source = self.resolver.resolve(old_path);
        ensure_managed(&source, "move")?;
        let is_dir = ensure_exists(&source)?;

        let item_name = item_name_or_source(item_name, &source)?;
        let folder = self.resolver.resolve(new_folder);
        let destination = folder.relative.join(&item_name);

        if destination == source.relative {
            tracing::debug!(path = %source.relative, "Move onto itself, nothing to do");
            return Ok(Mutation::consistent(destination));
        }

        ensure_not_reserved(&destination)?;
        let destination_abs = folder.absolute.join(&item_name);
        if exists(&destination_abs) {
            return Err(MediaError::DestinationExists(destination.to_string()));
        }
        if !folder.absolute.is_dir() {
            return Err(MediaError::NotFound(describe(&folder.relative)));
        }
        if is_dir && destination.starts_with(&source.relative) {
            return Err(MediaError::Validation(
                "cannot move a folder into itself".to_string(),
            ));
        }

        fs::rename(&source.absolute, &destination_abs)?;
        tracing::info!(from = %source.relative, to = %destination, "Moved asset");

        Ok(match self.move_sidecar(&source.relative, &destination) {
            Ok(()) => Mutation::consistent(destination),
            Err(e) => drift(destination, &source.relative, "move thumbnail", e),
        })
    }

    /// Regenerate the sidecar of an existing image.
    ///
    /// Returns `None` for non-images or when generation failed.
    pub fn regenerate_thumbnail(&self, path: &str) -> Result<Option<RelativePath>> {
        let target = self.resolver.resolve(path);
        ensure_managed(&target, "regenerate thumbnail for")?;
        if !target.absolute.is_file() {
            return Err(MediaError::NotFound(describe(&target.relative)));
        }

        Ok(self
            .thumbnails
            .generate(&target.absolute, &target.relative.parent()))
    }

    fn resolve_destination_folder(&self, folder: &str) -> Result<ResolvedPath> {
        let folder = self.resolver.resolve(folder);
        ensure_not_reserved(&folder.relative)?;
        if !folder.absolute.is_dir() {
            return Err(MediaError::NotFound(describe(&folder.relative)));
        }
        Ok(folder)
    }

    /// Move the sidecar of `from` to the sidecar location of `to`, replacing
    /// whatever sits there.
    ///
    /// Without a source sidecar, any stale sidecar at the destination is
    /// removed so the new asset never shows a thumbnail that isn't its own.
    fn move_sidecar(&self, from: &RelativePath, to: &RelativePath) -> io::Result<()> {
        let old_thumb = self.thumbnails.thumbnail_path(from);
        let new_thumb = self.thumbnails.thumbnail_path(to);
        if !exists(&old_thumb) {
            return remove_entry(&new_thumb).map(|_| ());
        }

        if let Some(parent) = new_thumb.parent() {
            fs::create_dir_all(parent)?;
        }
        remove_entry(&new_thumb)?;
        fs::rename(&old_thumb, &new_thumb)
    }

    /// Copy the sidecar of `from` to the sidecar location of `to`. A stale
    /// destination sidecar is removed when `from` has none.
    fn copy_sidecar(&self, from: &RelativePath, to: &RelativePath) -> io::Result<()> {
        let old_thumb = self.thumbnails.thumbnail_path(from);
        let new_thumb = self.thumbnails.thumbnail_path(to);
        if !exists(&old_thumb) {
            return remove_entry(&new_thumb).map(|_| ());
        }

        if let Some(parent) = new_thumb.parent() {
            fs::create_dir_all(parent)?;
        }
        remove_entry(&new_thumb)?;
        copy_entry(&old_thumb, &new_thumb)
    }
}

/// Reduce a folder name to `[a-zA-Z0-9-_]`.
pub fn sanitize_folder_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Find a free name in `folder` for `name`, probing `(copy)`, `(copy 2)`, ...
fn free_copy_name(folder: &Path, name: &str, is_dir: bool) -> Result<String> {
    if !exists(&folder.join(name)) {
        return Ok(name.to_string());
    }

    let (stem, ext) = split_name(name, is_dir);
    for attempt in 1..=MAX_COPY_ATTEMPTS {
        let candidate = if attempt == 1 {
            format!("{stem} (copy){ext}")
        } else {
            format!("{stem} (copy {attempt}){ext}")
        };
        if !exists(&folder.join(&candidate)) {
            return Ok(candidate);
        }
    }

    Err(MediaError::CopyNamesExhausted(name.to_string()))
}

/// Split `name` into stem and extension (with its dot). Folders keep the
/// whole name as stem.
fn split_name(name: &str, is_dir: bool) -> (&str, &str) {
    if is_dir {
        return (name, "");
    }
    match (Path::new(name).file_stem(), Path::new(name).extension()) {
        (Some(_), Some(ext)) => {
            let ext_len = ext.len() + 1;
            name.split_at(name.len() - ext_len)
        }
        _ => (name, ""),
    }
}

/// The requested destination name, or the source name when none was given.
fn item_name_or_source(item_name: &str, source: &ResolvedPath) -> Result<String> {
    if item_name.trim().is_empty() {
        // ensure_managed guarantees a non-root source
        let name = source.relative.file_name().unwrap_or_default();
        return Ok(name.to_string());
    }
    validate_item_name(item_name).map(str::to_string)
}

/// A single plain path segment.
fn validate_item_name(name: &str) -> Result<&str> {
    if name.is_empty() || name.contains(['/', '\\', '\0', ':']) {
        return Err(MediaError::Validation(format!("invalid name: {name:?}")));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(MediaError::Validation(format!("invalid name: {name:?}"))),
    }
}

fn is_reserved(relative: &RelativePath) -> bool {
    relative.segments().next() == Some(THUMBS_DIR)
}

pub(crate) fn ensure_not_reserved(relative: &RelativePath) -> Result<()> {
    if is_reserved(relative) {
        return Err(MediaError::Validation(format!(
            "the {THUMBS_DIR} folder is managed automatically"
        )));
    }
    Ok(())
}

/// Sources of mutations must be a real asset, neither the root (where
/// neutralized traversal lands) nor the thumbnail tree.
fn ensure_managed(target: &ResolvedPath, action: &str) -> Result<()> {
    if target.relative.is_root() {
        return Err(MediaError::Validation(format!("cannot {action} the asset root")));
    }
    ensure_not_reserved(&target.relative)
}

/// Returns whether the source is a directory.
fn ensure_exists(target: &ResolvedPath) -> Result<bool> {
    match fs::symlink_metadata(&target.absolute) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(MediaError::NotFound(describe(&target.relative)))
        }
        Err(e) => Err(e.into()),
    }
}

fn describe(relative: &RelativePath) -> String {
    if relative.is_root() {
        "asset root".to_string()
    } else {
        relative.to_string()
    }
}

/// Treat `NotFound` as an entry that disappeared between `read_dir` and
/// the call that produced `result`.
fn skip_vanished<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Remove a file or directory tree. Returns `false` if nothing was there.
fn remove_entry(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy a file, or a directory tree (symlinks inside are skipped).
fn copy_entry(source: &Path, destination: &Path) -> io::Result<()> {
    if !fs::symlink_metadata(source)?.is_dir() {
        fs::copy(source, destination)?;
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

fn drift<T>(value: T, relative: &RelativePath, action: &str, error: io::Error) -> Mutation<T> {
    tracing::warn!(path = %relative, error = %error, "Failed to {action}, thumbnail mirror drifted");
    Mutation::drifted(value, format!("failed to {action}: {error}"))
}
