//! mediashelf - a filesystem-backed media asset manager.
//!
//! Assets live under a single root directory. Images get a 250px JPEG
//! thumbnail in a `thumbs/` tree that mirrors the asset tree, and every
//! mutation keeps both trees aligned. The store is exposed over a small
//! JSON REST API.

pub mod asset;
pub mod config;
pub mod error;
pub mod logging;
pub mod web;

pub use asset::{
    AssetEntry, AssetKind, AssetStore, MediaType, MirrorState, Mutation, PathResolver,
    RelativePath, ResolvedPath, ThumbnailEngine, UploadedAsset,
};
pub use config::Config;
pub use error::{MediaError, Result};
pub use web::WebServer;
