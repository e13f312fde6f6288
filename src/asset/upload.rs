//! Upload ingestion.
//!
//! Writes an incoming byte stream into a resolved folder under a
//! collision-free name, then derives the thumbnail sidecar.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::Utc;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::store::{ensure_not_reserved, AssetStore, MAX_COPY_ATTEMPTS};
use super::types::{MediaType, RelativePath};
use crate::{MediaError, Result};

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Stored filename (sanitized basename, suffix, extension).
    pub filename: String,
    pub relative_path: RelativePath,
    pub media_type: MediaType,
    /// MIME type guessed from the stored filename.
    pub content_type: String,
    pub size: u64,
    /// Sidecar reference, present when a thumbnail was produced.
    pub thumbnail: Option<RelativePath>,
}

impl AssetStore {
    /// Store `reader` in `folder` under a name derived from `original_name`.
    ///
    /// The folder is created if missing. The stored name is
    /// `<sanitized basename>-<millisecond timestamp>.<ext>`; an existing file
    /// is never overwritten. Thumbnailing is best-effort and never fails the
    /// upload.
    pub fn ingest<R: Read>(
        &self,
        folder: &str,
        original_name: &str,
        reader: &mut R,
    ) -> Result<UploadedAsset> {
        let folder = self.resolver().resolve(folder);
        ensure_not_reserved(&folder.relative)?;
        fs::create_dir_all(&folder.absolute)?;

        let (stem, ext) = split_original_name(original_name);
        let base = sanitize_basename(stem);
        let ext = sanitize_extension(ext);
        let suffix = Utc::now().timestamp_millis();

        let (filename, path, mut file) = create_unique(&folder.absolute, &base, suffix, &ext)?;

        let written = io::copy(reader, &mut file).and_then(|n| file.sync_all().map(|_| n));
        let size = match written {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(e.into());
            }
        };
        drop(file);

        let relative = folder.relative.join(&filename);
        let thumbnail = self.thumbnails().generate(&path, &folder.relative);
        let media_type = MediaType::from_path(&path);

        tracing::info!(
            path = %relative,
            size,
            thumbnail = thumbnail.is_some(),
            "Stored upload"
        );

        Ok(UploadedAsset {
            content_type: mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string(),
            filename,
            relative_path: relative,
            media_type,
            size,
            thumbnail,
        })
    }
}

/// Open a new file named `<base>-<suffix>[-n]<ext>` that didn't exist before.
fn create_unique(
    folder: &Path,
    base: &str,
    suffix: i64,
    ext: &str,
) -> Result<(String, PathBuf, File)> {
    for attempt in 0..MAX_COPY_ATTEMPTS {
        let filename = if attempt == 0 {
            format!("{base}-{suffix}{ext}")
        } else {
            format!("{base}-{suffix}-{attempt}{ext}")
        };
        let path = folder.join(&filename);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((filename, path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(MediaError::UploadNamesExhausted(format!("{base}-{suffix}{ext}")))
}

/// Split a client filename into stem and extension, dropping any directory
/// part a browser may have sent along.
fn split_original_name(original: &str) -> (&str, &str) {
    let name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

/// Reduce a basename to `[a-zA-Z0-9_-]`.
///
/// Diacritics are stripped first, so `báo cáo` becomes `bao-cao`. Runs of
/// other characters collapse into a single `-`.
pub fn sanitize_basename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        let c = match c {
            'đ' => 'd',
            'Đ' => 'D',
            _ => c,
        };

        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercase extension with its dot, or empty.
fn sanitize_extension(ext: &str) -> String {
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if ext.is_empty() {
        ext
    } else {
        format!(".{ext}")
    }
}
