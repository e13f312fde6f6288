//! Media asset management for mediashelf.
//!
//! This module provides the filesystem-backed asset layer:
//! - Sandboxed path resolution under a single asset root
//! - A `thumbs/` sidecar tree mirroring the asset tree for images
//! - List, delete, create-folder, rename, copy and move operations that keep
//!   both trees aligned
//! - Upload ingestion with collision-free naming

mod path;
mod store;
mod thumbnail;
mod types;
mod upload;

pub use path::{PathResolver, ResolvedPath};
pub use store::{sanitize_folder_name, AssetStore, MAX_COPY_ATTEMPTS};
pub use thumbnail::{ThumbnailEngine, THUMBNAIL_QUALITY, THUMBNAIL_SIZE, THUMBS_DIR};
pub use types::{
    AssetEntry, AssetKind, MediaType, MirrorState, Mutation, RelativePath, IMAGE_EXTENSIONS,
    VIDEO_EXTENSIONS,
};
pub use upload::{sanitize_basename, UploadedAsset};
