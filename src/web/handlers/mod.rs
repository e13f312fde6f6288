//! API handlers for the asset manager.

pub mod asset;

pub use asset::*;
