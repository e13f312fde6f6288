//! Thumbnail generation for image assets.
//!
//! Thumbnails live in a `thumbs/` tree under the asset root that mirrors the
//! asset tree:
//! ```text
//! {root}/
//! ├── docs/
//! │   └── report-1700000000000.png
//! └── thumbs/
//!     └── docs/
//!         └── report-1700000000000.png   (JPEG bytes, original name kept)
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use super::types::{MediaType, RelativePath};
use crate::Result;

/// Name of the thumbnail directory under the asset root.
pub const THUMBS_DIR: &str = "thumbs";

/// Edge length of generated thumbnails (square).
pub const THUMBNAIL_SIZE: u32 = 250;

/// JPEG quality of generated thumbnails.
pub const THUMBNAIL_QUALITY: u8 = 50;

/// Produces and locates thumbnail sidecars.
#[derive(Debug, Clone)]
pub struct ThumbnailEngine {
    thumb_root: PathBuf,
    size: u32,
    quality: u8,
}

impl ThumbnailEngine {
    /// Create an engine writing under `{asset_root}/thumbs`.
    pub fn new(asset_root: &Path) -> Self {
        Self {
            thumb_root: asset_root.join(THUMBS_DIR),
            size: THUMBNAIL_SIZE,
            quality: THUMBNAIL_QUALITY,
        }
    }

    pub fn thumb_root(&self) -> &Path {
        &self.thumb_root
    }

    /// Absolute sidecar path for an asset.
    pub fn thumbnail_path(&self, relative: &RelativePath) -> PathBuf {
        self.thumb_root.join(relative.to_path_buf())
    }

    /// Sidecar path relative to the asset root (`thumbs/<relative>`).
    pub fn thumbnail_ref(relative: &RelativePath) -> RelativePath {
        RelativePath::from_segments(std::iter::once(THUMBS_DIR).chain(relative.segments()))
    }

    /// Whether the file extension is one we thumbnail.
    pub fn is_image(path: &Path) -> bool {
        MediaType::from_path(path) == MediaType::Image
    }

    /// Generate the sidecar for `original`, stored in `relative_folder`.
    ///
    /// Best-effort: non-images are skipped and every failure is logged and
    /// swallowed. Returns the sidecar reference when one was written.
    pub fn generate(&self, original: &Path, relative_folder: &RelativePath) -> Option<RelativePath> {
        if !Self::is_image(original) {
            return None;
        }

        let file_name = original.file_name()?.to_str()?;
        let relative = relative_folder.join(file_name);
        let target = self.thumbnail_path(&relative);

        match self.render(original, &target) {
            Ok(()) => {
                tracing::debug!(path = %relative, "Generated thumbnail");
                Some(Self::thumbnail_ref(&relative))
            }
            Err(e) => {
                tracing::warn!(path = %relative, error = %e, "Thumbnail generation failed");
                if target.is_file() {
                    let _ = fs::remove_file(&target);
                }
                None
            }
        }
    }

    fn render(&self, original: &Path, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let img = ImageReader::open(original)?.with_guessed_format()?.decode()?;
        let thumb = img.resize_to_fill(self.size, self.size, FilterType::Lanczos3);

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(thumb.to_rgb8());

        let mut writer = BufWriter::new(File::create(target)?);
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, self.quality))?;
        writer.flush()?;

        Ok(())
    }
}
