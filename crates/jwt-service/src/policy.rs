//! Trust policy: who we may send to, and who we accept tokens from.
//!
//! [`TrustPolicy`] is the single extension point for trust decisions.
//! [`StaticTrustPolicy`] is the built-in implementation backed by an
//! immutable recipient-to-key map and a [`SenderPolicy`].
//!
//! # Security
//!
//! The sender policy has two distinct modes. `Open` accepts tokens from any
//! sender; `AllowList` accepts exactly the listed senders (an empty list
//! accepts nobody). Open mode is logged at `warn` when a policy is built so
//! a missing allow-list never goes unnoticed.

use crate::signer::JwtSigner;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Delegated trust decisions for a [`TokenService`](crate::TokenService).
pub trait TrustPolicy: Send + Sync {
    /// Signer to use for tokens addressed to `recipient`.
    ///
    /// `None` means this service must not send to that recipient.
    fn key(&self, recipient: &str) -> Option<Arc<JwtSigner>>;

    /// Whether tokens issued by `sender` are accepted.
    fn validate(&self, sender: &str) -> bool;
}

impl<P: TrustPolicy + ?Sized> TrustPolicy for Arc<P> {
    fn key(&self, recipient: &str) -> Option<Arc<JwtSigner>> {
        (**self).key(recipient)
    }

    fn validate(&self, sender: &str) -> bool {
        (**self).validate(sender)
    }
}

/// Which senders a policy accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderPolicy {
    /// Accept tokens from any sender.
    Open,
    /// Accept tokens only from these senders.
    AllowList(HashSet<String>),
}

impl SenderPolicy {
    /// Build an allow-list from any iterator of identifiers.
    pub fn allow<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllowList(senders.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// `None` is open trust; `Some(set)` is exactly that allow-list.
impl From<Option<HashSet<String>>> for SenderPolicy {
    fn from(senders: Option<HashSet<String>>) -> Self {
        senders.map_or(Self::Open, Self::AllowList)
    }
}

/// Trust policy fixed at construction time.
#[derive(Debug, Clone)]
pub struct StaticTrustPolicy {
    keys: HashMap<String, Arc<JwtSigner>>,
    senders: SenderPolicy,
}

impl StaticTrustPolicy {
    /// Create a policy from recipient keys and a sender policy.
    pub fn new<I, S>(keys: I, senders: SenderPolicy) -> Self
    where
        I: IntoIterator<Item = (S, JwtSigner)>,
        S: Into<String>,
    {
        let keys: HashMap<String, Arc<JwtSigner>> = keys
            .into_iter()
            .map(|(recipient, signer)| (recipient.into(), Arc::new(signer)))
            .collect();

        #[allow(clippy::single_match_else)]
        match &senders {
            SenderPolicy::Open => tracing::warn!(
                target: "jwt_service.policy",
                recipients = keys.len(),
                "Trust policy built in open trust mode: tokens from any sender will be accepted"
            ),
            SenderPolicy::AllowList(allowed) => tracing::info!(
                target: "jwt_service.policy",
                recipients = keys.len(),
                allowed_senders = allowed.len(),
                "Trust policy built with sender allow-list"
            ),
        }

        Self { keys, senders }
    }

    /// Policy that accepts tokens from any sender.
    pub fn open<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = (S, JwtSigner)>,
        S: Into<String>,
    {
        Self::new(keys, SenderPolicy::Open)
    }

    /// Policy that accepts tokens only from `senders`.
    pub fn allow_list<I, S, A, T>(keys: I, senders: A) -> Self
    where
        I: IntoIterator<Item = (S, JwtSigner)>,
        S: Into<String>,
        A: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(keys, SenderPolicy::allow(senders))
    }

    #[must_use]
    pub fn sender_policy(&self) -> &SenderPolicy {
        &self.senders
    }

    /// Iterate over the recipients this policy can sign for.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl TrustPolicy for StaticTrustPolicy {
    fn key(&self, recipient: &str) -> Option<Arc<JwtSigner>> {
        self.keys.get(recipient).cloned()
    }

    fn validate(&self, sender: &str) -> bool {
        match &self.senders {
            SenderPolicy::Open => true,
            SenderPolicy::AllowList(allowed) => allowed.contains(sender),
        }
    }
}
