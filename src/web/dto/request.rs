//! Request DTOs for the asset API.

use serde::Deserialize;
use validator::Validate;

/// `?path=` query used by listing and deletion.
#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    /// Client-relative path; empty means the asset root.
    #[serde(default)]
    pub path: String,
}

/// Create folder request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder name (sanitized server-side).
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub folder_name: String,
    /// Parent folder; empty means the asset root.
    #[serde(default)]
    pub current_path: String,
}

/// Rename request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// Current path of the asset.
    #[validate(length(min = 1, message = "Path is required"))]
    pub old_path: String,
    /// New name within the same folder.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub new_name: String,
}

/// Copy or move request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Name at the destination; empty keeps the source name.
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub item_name: String,
    /// Current path of the asset.
    #[validate(length(min = 1, message = "Path is required"))]
    pub old_path: String,
    /// Destination folder; empty means the asset root.
    #[serde(default)]
    pub new_folder_path: String,
}

/// Thumbnail regeneration request.
#[derive(Debug, Deserialize, Validate)]
pub struct ThumbnailRequest {
    /// Path of the image.
    #[validate(length(min = 1, message = "Path is required"))]
    pub path: String,
}
