//! Middleware for the Web API.

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::{api_headers, file_headers};
