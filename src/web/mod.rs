//! Web API module for mediashelf.
//!
//! This module exposes the asset store over a JSON REST API and serves the
//! asset root, thumbnails included, as static files.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
