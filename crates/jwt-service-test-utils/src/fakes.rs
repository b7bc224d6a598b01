//! Recording trust policy for testing.
//!
//! `FakeTrustPolicy` answers from stubbed keys and senders and records every
//! call, so tests can assert which trust decisions a service asked for.
//! Clones share state: hand one clone to the service and inspect another.
//!
//! # Example
//!
//! ```rust,ignore
//! use jwt_service_test_utils::FakeTrustPolicy;
//!
//! let policy = FakeTrustPolicy::new()
//!     .with_key("billing", test_hs256_signer())
//!     .trusting("billing");
//!
//! let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");
//! // ... exercise service ...
//! assert_eq!(policy.validate_calls(), vec!["billing"]);
//! ```

use jwt_service::{JwtSigner, TrustPolicy};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Trust policy with stubbed answers and a call log.
#[derive(Debug, Clone, Default)]
pub struct FakeTrustPolicy {
    inner: Arc<Mutex<FakeTrustPolicyInner>>,
}

#[derive(Debug, Default)]
struct FakeTrustPolicyInner {
    keys: HashMap<String, Arc<JwtSigner>>,
    trusted: HashSet<String>,
    trust_everyone: bool,
    key_calls: Vec<String>,
    validate_calls: Vec<String>,
}

impl FakeTrustPolicy {
    /// Policy with no keys that trusts nobody.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub the signer returned for `recipient`.
    #[must_use]
    pub fn with_key(self, recipient: &str, signer: JwtSigner) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.keys.insert(recipient.to_string(), Arc::new(signer));
        }
        self
    }

    /// Trust `sender`.
    #[must_use]
    pub fn trusting(self, sender: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.trusted.insert(sender.to_string());
        }
        self
    }

    /// Trust every sender.
    #[must_use]
    pub fn trusting_everyone(self) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.trust_everyone = true;
        }
        self
    }

    /// Recipients passed to `key`, in call order.
    pub fn key_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().key_calls.clone()
    }

    /// Senders passed to `validate`, in call order.
    pub fn validate_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().validate_calls.clone()
    }

    /// Forget recorded calls, keeping stubs.
    pub fn clear_calls(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.key_calls.clear();
        inner.validate_calls.clear();
    }
}

impl TrustPolicy for FakeTrustPolicy {
    fn key(&self, recipient: &str) -> Option<Arc<JwtSigner>> {
        let mut inner = self.inner.lock().unwrap();
        inner.key_calls.push(recipient.to_string());
        inner.keys.get(recipient).cloned()
    }

    fn validate(&self, sender: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.validate_calls.push(sender.to_string());
        inner.trust_everyone || inner.trusted.contains(sender)
    }
}
