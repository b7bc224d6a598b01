//! Header access and bearer token extraction.

use axum::http::{request::Parts, HeaderMap, HeaderValue, Request};

/// Name of the header carrying bearer tokens.
pub const AUTHORIZATION: &str = "authorization";

/// Scheme prefix, compared case-insensitively.
const BEARER_PREFIX: &str = "bearer ";

/// Multi-valued, case-insensitive header lookup.
///
/// Implemented for the `http` types axum hands to handlers and middleware.
/// Values are raw bytes; opaque (non visible ASCII) values are kept so they
/// still take part in bearer selection.
pub trait HeaderSource {
    /// All values of header `name`, in the order they were received.
    fn header_values(&self, name: &str) -> Vec<&[u8]>;
}

impl HeaderSource for HeaderMap {
    fn header_values(&self, name: &str) -> Vec<&[u8]> {
        self.get_all(name).iter().map(HeaderValue::as_bytes).collect()
    }
}

impl<B> HeaderSource for Request<B> {
    fn header_values(&self, name: &str) -> Vec<&[u8]> {
        self.headers().header_values(name)
    }
}

impl HeaderSource for Parts {
    fn header_values(&self, name: &str) -> Vec<&[u8]> {
        self.headers.header_values(name)
    }
}

/// Select the raw token from the first `Bearer` authorization value.
///
/// The scheme match is case-insensitive; the token bytes are returned as
/// received. Later values are never consulted once a bearer value is found.
pub(crate) fn extract_bearer_token<'a>(values: &[&'a [u8]]) -> Option<&'a [u8]> {
    values.iter().copied().find_map(|value| {
        let scheme = value.get(..BEARER_PREFIX.len())?;
        if scheme.eq_ignore_ascii_case(BEARER_PREFIX.as_bytes()) {
            value.get(BEARER_PREFIX.len()..)
        } else {
            None
        }
    })
}
