//! Asset handlers for the Web API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};

use crate::asset::AssetStore;
use crate::config::{AssetsConfig, BYTES_PER_MB};
use crate::web::dto::{
    validate_name_field, ApiResponse, AssetResponse, CreateFolderRequest, OperationResponse,
    PathQuery, RenameRequest, ThumbnailRequest, ThumbnailResponse, TransferRequest,
    UploadResponse, ValidatedJson,
};
use crate::web::error::ApiError;

/// Application state shared by the asset handlers.
#[derive(Clone)]
pub struct AppState {
    /// Asset store.
    pub store: Arc<AssetStore>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// URL prefix under which the asset root is served.
    pub public_url_prefix: String,
}

impl AppState {
    /// Create a new application state with default limits.
    pub fn new(store: AssetStore) -> Self {
        Self {
            store: Arc::new(store),
            max_upload_size: AssetsConfig::default().max_upload_bytes(),
            public_url_prefix: "/files".to_string(),
        }
    }

    /// Create the state from the `[assets]` configuration.
    pub fn from_config(store: AssetStore, config: &AssetsConfig) -> Self {
        Self {
            max_upload_size: config.max_upload_bytes(),
            ..Self::new(store)
        }
        .with_public_url_prefix(&config.public_url_prefix)
    }

    /// Set the maximum upload size in megabytes.
    pub fn with_max_upload_size_mb(mut self, max_upload_size_mb: u64) -> Self {
        self.max_upload_size = max_upload_size_mb.saturating_mul(BYTES_PER_MB);
        self
    }

    /// Set the public URL prefix.
    pub fn with_public_url_prefix(mut self, prefix: &str) -> Self {
        self.public_url_prefix = prefix.trim_end_matches('/').to_string();
        self
    }
}

/// Run a store operation on the blocking pool.
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&AssetStore) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| {
            tracing::error!("Asset task failed: {}", e);
            ApiError::internal("Asset operation failed")
        })?
        .map_err(ApiError::from)
}

/// GET /api/assets?path= - List a folder.
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<Vec<AssetResponse>>>, ApiError> {
    let entries = run_blocking(&state, move |store| store.list(&query.path)).await?;

    let response = entries
        .into_iter()
        .map(|entry| AssetResponse::from_entry(entry, &state.public_url_prefix))
        .collect();

    Ok(Json(ApiResponse::new(response)))
}

/// DELETE /api/assets?path= - Delete a file or folder.
///
/// Deleting a missing path succeeds.
pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<OperationResponse>>, ApiError> {
    let (relative, mutation) = run_blocking(&state, move |store| {
        let relative = store.resolver().resolve(&query.path).relative;
        let mutation = store.delete(&query.path)?;
        Ok((relative, mutation))
    })
    .await?;

    Ok(Json(ApiResponse::new(OperationResponse::new(
        relative.to_string(),
        &mutation,
    ))))
}

/// POST /api/assets/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<Json<ApiResponse<OperationResponse>>, ApiError> {
    validate_name_field("folderName", &req.folder_name)?;

    let mutation = run_blocking(&state, move |store| {
        store.create_folder(&req.folder_name, &req.current_path)
    })
    .await?;

    Ok(Json(ApiResponse::new(mutation.into())))
}

/// POST /api/assets/rename - Rename an asset within its folder.
pub async fn rename_asset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<OperationResponse>>, ApiError> {
    validate_name_field("newName", &req.new_name)?;

    let mutation =
        run_blocking(&state, move |store| store.rename(&req.old_path, &req.new_name)).await?;

    Ok(Json(ApiResponse::new(mutation.into())))
}

/// POST /api/assets/copy - Copy an asset into another folder.
pub async fn copy_asset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> Result<Json<ApiResponse<OperationResponse>>, ApiError> {
    let mutation = run_blocking(&state, move |store| {
        store.copy(&req.item_name, &req.old_path, &req.new_folder_path)
    })
    .await?;

    Ok(Json(ApiResponse::new(mutation.into())))
}

/// POST /api/assets/move - Move an asset into another folder.
pub async fn move_asset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> Result<Json<ApiResponse<OperationResponse>>, ApiError> {
    let mutation = run_blocking(&state, move |store| {
        store.move_item(&req.item_name, &req.old_path, &req.new_folder_path)
    })
    .await?;

    Ok(Json(ApiResponse::new(mutation.into())))
}

/// POST /api/assets/thumbnail - Regenerate the thumbnail of an image.
pub async fn regenerate_thumbnail(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ThumbnailRequest>,
) -> Result<Json<ApiResponse<ThumbnailResponse>>, ApiError> {
    let (relative, thumbnail) = run_blocking(&state, move |store| {
        let relative = store.resolver().resolve(&req.path).relative;
        let thumbnail = store.regenerate_thumbnail(&req.path)?;
        Ok((relative, thumbnail))
    })
    .await?;

    Ok(Json(ApiResponse::new(ThumbnailResponse {
        success: true,
        relative_path: relative.to_string(),
        thumbnail_url: thumbnail
            .as_ref()
            .map(|t| crate::web::dto::public_url(&state.public_url_prefix, t)),
    })))
}

/// POST /api/assets/upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field and an optional
/// "folder" field naming the target folder.
pub async fn upload_asset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut filename: Option<String> = None;
    let mut folder = String::new();
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to read file content: {}", e);
                            ApiError::bad_request("Failed to read file")
                        })?
                        .to_vec(),
                );
            }
            "folder" => {
                folder = field.text().await.map_err(|e| {
                    tracing::error!("Failed to read folder field: {}", e);
                    ApiError::bad_request("Invalid folder")
                })?;
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let filename = filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No filename provided"))?;

    if content.len() as u64 > state.max_upload_size {
        let max_mb = state.max_upload_size / BYTES_PER_MB;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let uploaded = run_blocking(&state, move |store| {
        store.ingest(&folder, &filename, &mut content.as_slice())
    })
    .await?;

    Ok(Json(ApiResponse::new(UploadResponse::from_uploaded(
        uploaded,
        &state.public_url_prefix,
    ))))
}
