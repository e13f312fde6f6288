//! Web API Asset Tests
//!
//! Integration tests for the asset endpoints and static file serving.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use image::{ImageFormat, Rgb, RgbImage};
use mediashelf::web::handlers::AppState;
use mediashelf::web::router::{create_health_router, create_router};
use mediashelf::AssetStore;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Create a test server over a fresh asset root.
fn create_test_server() -> (TempDir, TestServer) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store =
        AssetStore::new(temp_dir.path().join("assets")).expect("Failed to create asset store");

    let app_state = Arc::new(AppState::new(store).with_max_upload_size_mb(1));
    let router = create_router(app_state, &[]).merge(create_health_router());

    let server = TestServer::new(router).expect("Failed to create test server");
    (temp_dir, server)
}

fn asset_root(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("assets")
}

fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(800, 600, Rgb([30, 120, 200]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect()
}

async fn upload(server: &TestServer, folder: &str, filename: &str, content: Vec<u8>) -> Value {
    let form = MultipartForm::new()
        .add_text("folder", folder.to_string())
        .add_part("file", Part::bytes(content).file_name(filename.to_string()));

    let response = server.post("/api/assets/upload").multipart(form).await;
    response.assert_status_ok();
    response.json::<Value>()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (_temp_dir, server) = create_test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

// ============================================================================
// List Tests
// ============================================================================

#[tokio::test]
async fn test_list_empty_root() {
    let (_temp_dir, server) = create_test_server();

    let response = server.get("/api/assets").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_folders_first_and_hides_thumbs() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("b.mp4"), b"video");
    write_file(&root.join("a.txt"), b"text");
    fs::create_dir_all(root.join("zeta")).unwrap();
    fs::create_dir_all(root.join("thumbs")).unwrap();

    let response = server.get("/api/assets").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(names(&body), vec!["zeta", "a.txt", "b.mp4"]);

    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries[0]["kind"], "folder");
    assert!(entries[0].get("downloadURL").is_none());
    assert_eq!(entries[2]["kind"], "file");
    assert_eq!(entries[2]["mediaType"], "video");
    assert_eq!(entries[2]["downloadURL"], "/files/b.mp4");
    assert!(entries[2].get("thumbnailURL").is_none());
}

#[tokio::test]
async fn test_list_missing_folder() {
    let (_temp_dir, server) = create_test_server();

    let response = server
        .get("/api/assets")
        .add_query_param("path", "nope")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_traversal_falls_back_to_root() {
    let (temp_dir, server) = create_test_server();
    write_file(&asset_root(&temp_dir).join("inside.txt"), b"x");
    write_file(&temp_dir.path().join("outside.txt"), b"secret");

    let response = server
        .get("/api/assets")
        .add_query_param("path", "../")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(names(&body), vec!["inside.txt"]);
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_image_creates_thumbnail() {
    let (temp_dir, server) = create_test_server();

    let body = upload(&server, "docs", "báo cáo.jpg", jpeg_bytes()).await;
    let data = &body["data"];

    let filename = data["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("bao-cao-"));
    assert!(filename.ends_with(".jpg"));
    assert_eq!(data["relativePath"], format!("docs/{}", filename));
    assert_eq!(data["classifiedType"], "image");
    assert_eq!(data["contentType"], "image/jpeg");
    assert_eq!(data["downloadURL"], format!("/files/docs/{}", filename));
    assert_eq!(
        data["thumbnailURL"],
        format!("/files/thumbs/docs/{}", filename)
    );

    let root = asset_root(&temp_dir);
    assert!(root.join("docs").join(&filename).is_file());
    let thumb = image::open(root.join("thumbs").join("docs").join(&filename)).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (250, 250));

    // The listing now carries the thumbnail
    let response = server
        .get("/api/assets")
        .add_query_param("path", "docs")
        .await;
    response.assert_status_ok();
    let listing: Value = response.json();
    assert_eq!(
        listing["data"][0]["thumbnailURL"],
        format!("/files/thumbs/docs/{}", filename)
    );

    // Both the original and the thumbnail are served
    let response = server.get(&format!("/files/docs/{}", filename)).await;
    response.assert_status_ok();
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    server
        .get(&format!("/files/thumbs/docs/{}", filename))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_upload_video_has_no_thumbnail() {
    let (_temp_dir, server) = create_test_server();

    let body = upload(&server, "", "clip.webm", b"not really webm".to_vec()).await;

    assert_eq!(body["data"]["classifiedType"], "video");
    assert!(body["data"].get("thumbnailURL").is_none());
}

#[tokio::test]
async fn test_upload_without_file() {
    let (_temp_dir, server) = create_test_server();

    let form = MultipartForm::new().add_text("folder", "docs");
    let response = server.post("/api/assets/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let (_temp_dir, server) = create_test_server();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 1024 * 1024 + 1]).file_name("big.bin"),
    );
    let response = server.post("/api/assets/upload").multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_into_thumbs_rejected() {
    let (_temp_dir, server) = create_test_server();

    let form = MultipartForm::new()
        .add_text("folder", "thumbs")
        .add_part("file", Part::bytes(jpeg_bytes()).file_name("x.jpg"));
    let response = server.post("/api/assets/upload").multipart(form).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Folder Tests
// ============================================================================

#[tokio::test]
async fn test_create_folder_sanitizes_name() {
    let (temp_dir, server) = create_test_server();

    let response = server
        .post("/api/assets/folders")
        .json(&json!({
            "folderName": "My Photos!",
            "currentPath": "albums"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["relativePath"], "albums/My-Photos-");
    assert!(asset_root(&temp_dir).join("albums/My-Photos-").is_dir());
}

#[tokio::test]
async fn test_create_folder_validation() {
    let (_temp_dir, server) = create_test_server();

    let response = server
        .post("/api/assets/folders")
        .json(&json!({ "folderName": "" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let response = server
        .post("/api/assets/folders")
        .json(&json!({ "currentPath": "x" }))
        .await;
    assert!(response.status_code().is_client_error());
}

// ============================================================================
// Rename Tests
// ============================================================================

#[tokio::test]
async fn test_rename_moves_thumbnail() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("a.png"), b"original");
    write_file(&root.join("thumbs/a.png"), b"thumb");

    let response = server
        .post("/api/assets/rename")
        .json(&json!({ "oldPath": "a.png", "newName": "b.png" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["relativePath"], "b.png");
    assert_eq!(body["data"]["mirrorConsistent"], true);

    assert!(!root.join("a.png").exists());
    assert!(root.join("b.png").is_file());
    assert!(!root.join("thumbs/a.png").exists());
    assert!(root.join("thumbs/b.png").is_file());
}

#[tokio::test]
async fn test_rename_conflict() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("a.png"), b"a");
    write_file(&root.join("b.png"), b"b");

    let response = server
        .post("/api/assets/rename")
        .json(&json!({ "oldPath": "a.png", "newName": "b.png" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NAME_CONFLICT");
    assert_eq!(fs::read(root.join("a.png")).unwrap(), b"a");
    assert_eq!(fs::read(root.join("b.png")).unwrap(), b"b");
}

#[tokio::test]
async fn test_rename_missing_source() {
    let (_temp_dir, server) = create_test_server();

    let response = server
        .post("/api/assets/rename")
        .json(&json!({ "oldPath": "ghost.png", "newName": "b.png" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_rejects_path_in_name() {
    let (temp_dir, server) = create_test_server();
    write_file(&asset_root(&temp_dir).join("a.png"), b"a");

    let response = server
        .post("/api/assets/rename")
        .json(&json!({ "oldPath": "a.png", "newName": "../b.png" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(asset_root(&temp_dir).join("a.png").is_file());
}

// ============================================================================
// Copy Tests
// ============================================================================

#[tokio::test]
async fn test_copy_disambiguates_names() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("a.png"), b"a");
    write_file(&root.join("thumbs/a.png"), b"thumb");

    let request = json!({ "itemName": "a.png", "oldPath": "a.png", "newFolderPath": "" });

    let first = server.post("/api/assets/copy").json(&request).await;
    first.assert_status_ok();
    assert_eq!(first.json::<Value>()["data"]["relativePath"], "a (copy).png");

    let second = server.post("/api/assets/copy").json(&request).await;
    second.assert_status_ok();
    assert_eq!(
        second.json::<Value>()["data"]["relativePath"],
        "a (copy 2).png"
    );

    assert!(root.join("a (copy).png").is_file());
    assert!(root.join("a (copy 2).png").is_file());
    assert!(root.join("thumbs/a (copy).png").is_file());
    assert!(root.join("thumbs/a (copy 2).png").is_file());
}

#[tokio::test]
async fn test_copy_into_missing_folder() {
    let (temp_dir, server) = create_test_server();
    write_file(&asset_root(&temp_dir).join("a.png"), b"a");

    let response = server
        .post("/api/assets/copy")
        .json(&json!({ "itemName": "a.png", "oldPath": "a.png", "newFolderPath": "nowhere" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Move Tests
// ============================================================================

#[tokio::test]
async fn test_move_with_thumbnail() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("a.png"), b"a");
    write_file(&root.join("thumbs/a.png"), b"thumb");
    fs::create_dir_all(root.join("archive")).unwrap();

    let response = server
        .post("/api/assets/move")
        .json(&json!({ "itemName": "a.png", "oldPath": "a.png", "newFolderPath": "archive" }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["data"]["relativePath"],
        "archive/a.png"
    );
    assert!(root.join("archive/a.png").is_file());
    assert!(root.join("thumbs/archive/a.png").is_file());
    assert!(!root.join("thumbs/a.png").exists());
}

#[tokio::test]
async fn test_move_onto_existing_destination() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("a.png"), b"source");
    write_file(&root.join("archive/a.png"), b"existing");

    let response = server
        .post("/api/assets/move")
        .json(&json!({ "itemName": "a.png", "oldPath": "a.png", "newFolderPath": "archive" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "DESTINATION_EXISTS");
    assert_eq!(fs::read(root.join("a.png")).unwrap(), b"source");
    assert_eq!(fs::read(root.join("archive/a.png")).unwrap(), b"existing");
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("docs/a.png"), b"a");
    write_file(&root.join("thumbs/docs/a.png"), b"thumb");

    let response = server
        .delete("/api/assets")
        .add_query_param("path", "docs")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["success"], true);
    assert!(!root.join("docs").exists());
    assert!(!root.join("thumbs/docs").exists());

    let response = server
        .delete("/api/assets")
        .add_query_param("path", "docs")
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_delete_traversal_never_touches_outside() {
    let (temp_dir, server) = create_test_server();
    write_file(&temp_dir.path().join("outside.txt"), b"keep");
    write_file(&asset_root(&temp_dir).join("inside.txt"), b"keep");

    let response = server
        .delete("/api/assets")
        .add_query_param("path", "../outside.txt")
        .await;

    // `../outside.txt` resolves to `outside.txt` under the root, which is missing
    response.assert_status_ok();
    assert!(temp_dir.path().join("outside.txt").is_file());
    assert!(asset_root(&temp_dir).join("inside.txt").is_file());

    let response = server
        .delete("/api/assets")
        .add_query_param("path", "..")
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(asset_root(&temp_dir).join("inside.txt").is_file());
}

// ============================================================================
// Thumbnail Tests
// ============================================================================

#[tokio::test]
async fn test_regenerate_thumbnail() {
    let (temp_dir, server) = create_test_server();
    let root = asset_root(&temp_dir);
    write_file(&root.join("pics/photo.jpg"), &jpeg_bytes());

    let response = server
        .post("/api/assets/thumbnail")
        .json(&json!({ "path": "pics/photo.jpg" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["thumbnailURL"], "/files/thumbs/pics/photo.jpg");
    assert!(root.join("thumbs/pics/photo.jpg").is_file());
}
