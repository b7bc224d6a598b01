//! Metrics definitions for the token service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `jwt_service_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `status`: 2 values (success, error)
//! - `reason`: bounded by the rejection variants, `none` on success
//!
//! Service identifiers are never used as labels.
//!
//! The crate only records through the `metrics` facade; installing an
//! exporter is left to the host service.

use metrics::counter;

/// Record the outcome of an inbound decode.
///
/// Metric: `jwt_service_decode_total`
/// Labels: `status`, `reason`
pub fn record_decode(status: &'static str, reason: Option<&'static str>) {
    counter!(
        "jwt_service_decode_total",
        "status" => status,
        "reason" => reason.unwrap_or("none"),
    )
    .increment(1);
}

/// Record the outcome of an outbound encode.
///
/// Metric: `jwt_service_encode_total`
/// Labels: `status`, `reason`
pub fn record_encode(status: &'static str, reason: Option<&'static str>) {
    counter!(
        "jwt_service_encode_total",
        "status" => status,
        "reason" => reason.unwrap_or("none"),
    )
    .increment(1);
}
