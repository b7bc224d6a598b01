//! Observability for the token service.

pub mod metrics;
