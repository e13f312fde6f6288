//! Response DTOs for the asset API.

use serde::Serialize;

use crate::asset::{
    AssetEntry, AssetKind, MediaType, MirrorState, Mutation, RelativePath, UploadedAsset,
};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Public URLs
// ============================================================================

/// Build the public URL of an asset-relative path.
///
/// Every segment is percent-encoded, so `docs/báo cáo.png` under `/files`
/// becomes `/files/docs/b%C3%A1o%20c%C3%A1o.png`.
pub fn public_url(prefix: &str, relative: &RelativePath) -> String {
    let encoded: Vec<String> = relative
        .segments()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect();
    format!("{}/{}", prefix.trim_end_matches('/'), encoded.join("/"))
}

// ============================================================================
// Asset Responses
// ============================================================================

/// One entry of a folder listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub name: String,
    pub kind: AssetKind,
    pub relative_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Files only.
    #[serde(rename = "downloadURL", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Present only when a sidecar exists.
    #[serde(rename = "thumbnailURL", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl AssetResponse {
    pub fn from_entry(entry: AssetEntry, prefix: &str) -> Self {
        let download_url = (entry.kind == AssetKind::File)
            .then(|| public_url(prefix, &entry.relative_path));

        Self {
            thumbnail_url: entry.thumbnail.as_ref().map(|t| public_url(prefix, t)),
            download_url,
            name: entry.name,
            kind: entry.kind,
            relative_path: entry.relative_path.to_string(),
            media_type: entry.media_type,
            size: entry.size,
        }
    }
}

/// Result of a mutating operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub success: bool,
    /// Path of the affected asset after the operation.
    pub relative_path: String,
    /// False when the thumbnail tree could not follow the primary change.
    pub mirror_consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_error: Option<String>,
}

impl OperationResponse {
    pub fn new<T>(relative_path: impl Into<String>, mutation: &Mutation<T>) -> Self {
        let mirror_error = match &mutation.mirror {
            MirrorState::Consistent => None,
            MirrorState::Drifted { reason } => Some(reason.clone()),
        };

        Self {
            success: true,
            relative_path: relative_path.into(),
            mirror_consistent: mirror_error.is_none(),
            mirror_error,
        }
    }
}

impl From<Mutation<RelativePath>> for OperationResponse {
    fn from(mutation: Mutation<RelativePath>) -> Self {
        Self::new(mutation.value.to_string(), &mutation)
    }
}

/// Result of an upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Stored filename.
    pub filename: String,
    pub relative_path: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    pub classified_type: MediaType,
    pub content_type: String,
    pub size: u64,
    #[serde(rename = "thumbnailURL", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl UploadResponse {
    pub fn from_uploaded(uploaded: UploadedAsset, prefix: &str) -> Self {
        Self {
            download_url: public_url(prefix, &uploaded.relative_path),
            thumbnail_url: uploaded.thumbnail.as_ref().map(|t| public_url(prefix, t)),
            filename: uploaded.filename,
            relative_path: uploaded.relative_path.to_string(),
            classified_type: uploaded.media_type,
            content_type: uploaded.content_type,
            size: uploaded.size,
        }
    }
}

/// Result of a thumbnail regeneration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResponse {
    pub success: bool,
    pub relative_path: String,
    /// Absent when the asset is not an image or rendering failed.
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_encodes_segments() {
        let rel = RelativePath::root().join("docs").join("báo cáo.png");
        assert_eq!(
            public_url("/files", &rel),
            "/files/docs/b%C3%A1o%20c%C3%A1o.png"
        );
        assert_eq!(public_url("/files/", &rel), public_url("/files", &rel));
    }

    #[test]
    fn test_asset_response_folder_has_no_urls() {
        let entry = AssetEntry {
            name: "docs".to_string(),
            kind: AssetKind::Folder,
            relative_path: RelativePath::root().join("docs"),
            media_type: None,
            thumbnail: None,
            size: None,
        };

        let json = serde_json::to_value(AssetResponse::from_entry(entry, "/files")).unwrap();
        assert_eq!(json["kind"], "folder");
        assert_eq!(json["relativePath"], "docs");
        assert!(json.get("downloadURL").is_none());
        assert!(json.get("thumbnailURL").is_none());
    }

    #[test]
    fn test_asset_response_image_with_thumbnail() {
        let rel = RelativePath::root().join("a.png");
        let entry = AssetEntry {
            name: "a.png".to_string(),
            kind: AssetKind::File,
            thumbnail: Some(RelativePath::root().join("thumbs").join("a.png")),
            relative_path: rel,
            media_type: Some(MediaType::Image),
            size: Some(10),
        };

        let json = serde_json::to_value(AssetResponse::from_entry(entry, "/files")).unwrap();
        assert_eq!(json["mediaType"], "image");
        assert_eq!(json["downloadURL"], "/files/a.png");
        assert_eq!(json["thumbnailURL"], "/files/thumbs/a.png");
    }

    #[test]
    fn test_operation_response_reports_drift() {
        let ok = OperationResponse::from(Mutation::consistent(RelativePath::root().join("b")));
        assert!(ok.mirror_consistent);
        assert!(ok.mirror_error.is_none());

        let drifted = OperationResponse::from(Mutation::drifted(
            RelativePath::root().join("b"),
            "permission denied",
        ));
        assert!(drifted.success);
        assert!(!drifted.mirror_consistent);
        assert_eq!(drifted.mirror_error.as_deref(), Some("permission denied"));
    }

    #[test]
    fn test_upload_response_uses_url_field_names() {
        let uploaded = UploadedAsset {
            filename: "clip-1.mp4".to_string(),
            relative_path: RelativePath::root().join("docs").join("clip-1.mp4"),
            media_type: MediaType::Video,
            content_type: "video/mp4".to_string(),
            size: 3,
            thumbnail: None,
        };

        let json =
            serde_json::to_value(UploadResponse::from_uploaded(uploaded, "/files")).unwrap();
        assert_eq!(json["downloadURL"], "/files/docs/clip-1.mp4");
        assert_eq!(json["classifiedType"], "video");
        assert!(json.get("downloadUrl").is_none());
        assert!(json.get("thumbnailURL").is_none());

        let thumb = ThumbnailResponse {
            success: true,
            relative_path: "a.png".to_string(),
            thumbnail_url: Some("/files/thumbs/a.png".to_string()),
        };
        let json = serde_json::to_value(thumb).unwrap();
        assert_eq!(json["thumbnailURL"], "/files/thumbs/a.png");
    }
}
