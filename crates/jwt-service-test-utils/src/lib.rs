//! # jwt-service Test Utilities
//!
//! Shared test utilities for the `jwt-service` crate.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (seeded Ed25519 keys, a fixed HMAC secret)
//! - Test data builders (`TestTokenBuilder`)
//! - A recording trust policy (`FakeTrustPolicy`)
//! - Request builders for middleware tests
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jwt_service_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let signer = test_ed25519_signer(1)?;
//!
//!     let jwt = TestTokenBuilder::new()
//!         .from("billing")
//!         .with_scope("jobs:write")
//!         .sign(&signer);
//!
//!     jwt.assert_valid_jwt("EdDSA")
//!         .assert_has_scope("jobs:write");
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod fakes;
pub mod requests;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use fakes::*;
pub use requests::*;
pub use token_builders::*;
