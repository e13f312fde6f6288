//! Security headers middleware.

use axum::{
    body::Body,
    http::{header, header::HeaderValue, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

fn insert_common(headers: &mut HeaderMap) {
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
}

/// Headers for JSON API responses.
///
/// Adds `nosniff`, a referrer policy and `Cache-Control: no-store` unless
/// the handler set its own cache policy.
pub async fn api_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    insert_common(headers);
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        );
    }

    response
}

/// Headers for served asset files.
///
/// Uploaded content is untrusted: a sandboxing CSP keeps an uploaded HTML
/// or SVG file from running script in the site's origin when opened directly.
pub async fn file_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    insert_common(headers);
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("sandbox; default-src 'none'; img-src 'self'; media-src 'self'"),
    );

    response
}
