//! Router configuration for the Web API.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    copy_asset, create_folder, delete_asset, list_assets, move_asset, regenerate_thumbnail,
    rename_asset, upload_asset, AppState,
};
use super::middleware::{api_headers, create_cors_layer, file_headers};

/// Multipart framing allowance on top of the configured upload limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
///
/// Mounts the asset API under `/api/assets` and serves the asset root
/// (including the `thumbs/` tree) under the public URL prefix.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let api_routes = Router::new()
        .route("/api/assets", get(list_assets).delete(delete_asset))
        .route("/api/assets/upload", post(upload_asset))
        .route("/api/assets/folders", post(create_folder))
        .route("/api/assets/rename", post(rename_asset))
        .route("/api/assets/copy", post(copy_asset))
        .route("/api/assets/move", post(move_asset))
        .route("/api/assets/thumbnail", post(regenerate_thumbnail))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(api_headers));

    let files = create_files_router(&app_state.public_url_prefix, app_state.store.root());

    Router::new()
        .merge(api_routes)
        .merge(files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Serve the asset root read-only under `prefix`.
fn create_files_router<S>(prefix: &str, root: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .nest_service(prefix, ServeDir::new(root))
        .layer(middleware::from_fn(file_headers))
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetStore;
    use tempfile::TempDir;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
    }

    #[test]
    fn test_create_router() {
        let temp_dir = TempDir::new().unwrap();
        let store = AssetStore::new(temp_dir.path()).unwrap();
        let state = Arc::new(AppState::new(store));

        let _router = create_router(state, &[]);
    }
}
