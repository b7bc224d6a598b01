//! Request builders for middleware and extractor tests.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Request};

/// `GET uri` with one `authorization` value per entry, in order.
pub fn request_with_authorization(uri: &str, values: &[&str]) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    for value in values {
        builder = builder.header("authorization", *value);
    }
    builder.body(Body::empty()).expect("Failed to build test request")
}

/// `GET uri` carrying `Authorization: Bearer <jwt>`.
pub fn bearer_request(uri: &str, jwt: &str) -> Request<Body> {
    request_with_authorization(uri, &[&format!("Bearer {jwt}")])
}

/// `GET uri` without an `authorization` header.
pub fn anonymous_request(uri: &str) -> Request<Body> {
    request_with_authorization(uri, &[])
}

/// Header map with one `authorization` value per entry, in order.
pub fn authorization_headers(values: &[&str]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for value in values {
        headers.append(
            "authorization",
            HeaderValue::from_str(value).expect("Invalid header value"),
        );
    }
    headers
}

/// Header map from raw bytes, for values that are not visible ASCII.
pub fn raw_authorization_headers(values: &[&[u8]]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for value in values {
        headers.append(
            "authorization",
            HeaderValue::from_bytes(value).expect("Invalid header bytes"),
        );
    }
    headers
}
