//! Integration tests for `TokenService` decode and encode
//!
//! Exercises the public API end to end: header selection, verification,
//! audience and sender checks, and issuance through a trust policy.

use jwt_service::{
    JwtSigner, Payload, SenderPolicy, ServiceToken, StaticTrustPolicy, TokenError, TokenService,
    MAX_JWT_SIZE_BYTES,
};
use jwt_service_test_utils::{
    authorization_headers, raw_authorization_headers, test_ed25519_signer, test_ed25519_verifier,
    test_hs256_signer, FakeTrustPolicy, TestTokenBuilder, TokenAssertions, TEST_SECRET,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Minimal payload carrying only the routing claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Peer {
    from: String,
    to: String,
}

impl Payload for Peer {
    fn sender(&self) -> &str {
        &self.from
    }

    fn recipient(&self) -> &str {
        &self.to
    }
}

fn peer(from: &str, to: &str) -> Peer {
    Peer {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn service_with(senders: SenderPolicy) -> TokenService {
    let policy = StaticTrustPolicy::new(Vec::<(String, JwtSigner)>::new(), senders);
    TokenService::new(JwtSigner::hs256(TEST_SECRET), Arc::new(policy), "test")
}

fn bearer_for(payload: &impl Serialize, scheme: &str) -> String {
    let jwt = JwtSigner::hs256(TEST_SECRET).sign(payload).unwrap();
    format!("{scheme} {jwt}")
}

// ============================================================================
// Decode: reference scenario
// ============================================================================

#[test]
fn test_decode_reference_scenario() {
    let service = service_with(SenderPolicy::Open);

    let headers = authorization_headers(&[&bearer_for(&peer("peerA", "test"), "bearer")]);
    assert_eq!(service.decode::<Peer>(&headers), Ok(peer("peerA", "test")));

    let headers = authorization_headers(&[&bearer_for(&peer("peerA", "other-service"), "bearer")]);
    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );

    let service = service_with(SenderPolicy::allow(["peerB"]));
    let headers = authorization_headers(&[&bearer_for(&peer("peerA", "test"), "bearer")]);
    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );
}

#[test]
fn test_decode_round_trip_preserves_payload() {
    let service = service_with(SenderPolicy::Open);
    let original = ServiceToken::new("billing", "test", Duration::from_secs(300))
        .with_scope("jobs:read jobs:write");

    let headers = authorization_headers(&[&bearer_for(&original, "Bearer")]);
    let decoded: ServiceToken = service.decode(&headers).unwrap();

    assert_eq!(decoded, original);
    assert!(decoded.has_scope("jobs:write"));
}

#[test]
fn test_decode_bearer_scheme_is_case_insensitive() {
    let service = service_with(SenderPolicy::Open);

    for scheme in ["bearer", "Bearer", "BEARER", "bEaReR"] {
        let headers = authorization_headers(&[&bearer_for(&peer("peerA", "test"), scheme)]);
        assert!(
            service.decode::<Peer>(&headers).is_ok(),
            "scheme {scheme} should be accepted"
        );
    }
}

// ============================================================================
// Decode: audience and sender enforcement
// ============================================================================

#[test]
fn test_decode_rejects_every_other_audience() {
    let service = service_with(SenderPolicy::Open);

    for audience in ["other-service", "Test", "TEST", "test ", " test", ""] {
        let headers = authorization_headers(&[&bearer_for(&peer("peerA", audience), "Bearer")]);
        assert_eq!(
            service.decode::<Peer>(&headers),
            Err(TokenError::Unauthorized),
            "audience {audience:?} must be rejected"
        );
    }
}

#[test]
fn test_decode_enforces_allow_list() {
    let service = service_with(SenderPolicy::allow(["a", "b"]));

    for (sender, accepted) in [("a", true), ("b", true), ("c", false), ("A", false)] {
        let headers = authorization_headers(&[&bearer_for(&peer(sender, "test"), "Bearer")]);
        assert_eq!(
            service.decode::<Peer>(&headers).is_ok(),
            accepted,
            "sender {sender}"
        );
    }
}

#[test]
fn test_decode_open_trust_accepts_unknown_senders() {
    let service = service_with(SenderPolicy::Open);

    for sender in ["never-seen-before", "x", "peer with spaces"] {
        let headers = authorization_headers(&[&bearer_for(&peer(sender, "test"), "Bearer")]);
        assert_eq!(service.decode::<Peer>(&headers), Ok(peer(sender, "test")));
    }
}

#[test]
fn test_decode_empty_allow_list_rejects_everyone() {
    let service = service_with(SenderPolicy::allow(Vec::<String>::new()));
    let headers = authorization_headers(&[&bearer_for(&peer("peerA", "test"), "Bearer")]);

    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );
}

// ============================================================================
// Decode: header handling
// ============================================================================

#[test]
fn test_decode_header_failures_never_reach_the_policy() {
    let policy = FakeTrustPolicy::new().trusting_everyone();
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");
    let valid_jwt = JwtSigner::hs256(TEST_SECRET)
        .sign(&peer("peerA", "test"))
        .unwrap();

    let failures = [
        authorization_headers(&[]),
        authorization_headers(&[""]),
        authorization_headers(&[&format!("Token {valid_jwt}")]),
        authorization_headers(&[&format!("Bearer{valid_jwt}")]),
        authorization_headers(&["Basic dXNlcjpwYXNz"]),
    ];

    for headers in &failures {
        assert_eq!(
            service.decode::<Peer>(headers),
            Err(TokenError::Unauthorized)
        );
    }
    assert!(policy.validate_calls().is_empty());
}

#[test]
fn test_decode_bad_signature_never_reaches_the_policy() {
    let policy = FakeTrustPolicy::new().trusting_everyone();
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");

    let forged = JwtSigner::hs256(b"not-the-secret")
        .sign(&peer("peerA", "test"))
        .unwrap();
    let headers = authorization_headers(&[&format!("Bearer {forged}")]);

    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );
    assert!(policy.validate_calls().is_empty());
}

#[test]
fn test_decode_asks_policy_about_sender_once() {
    let policy = FakeTrustPolicy::new().trusting("peerA");
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");

    let headers = authorization_headers(&[&bearer_for(&peer("peerA", "test"), "Bearer")]);
    assert!(service.decode::<Peer>(&headers).is_ok());

    assert_eq!(policy.validate_calls(), vec!["peerA"]);
    assert!(policy.key_calls().is_empty());
}

#[test]
fn test_decode_uses_first_bearer_value() {
    let service = service_with(SenderPolicy::Open);
    let valid = bearer_for(&peer("peerA", "test"), "Bearer");

    let headers = authorization_headers(&["Basic dXNlcjpwYXNz", &valid]);
    assert_eq!(service.decode::<Peer>(&headers), Ok(peer("peerA", "test")));

    // A later valid token does not rescue an earlier bearer value
    let headers = authorization_headers(&["Bearer garbage", &valid]);
    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );
}

#[test]
fn test_decode_opaque_first_bearer_value_is_not_skipped() {
    let policy = FakeTrustPolicy::new().trusting_everyone();
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");
    let valid = bearer_for(&peer("peerA", "test"), "Bearer");

    let headers = raw_authorization_headers(&[b"bearer t\xc3\xb6ken", valid.as_bytes()]);
    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );

    let headers = raw_authorization_headers(&[b"Bearer \xff\xfe", valid.as_bytes()]);
    assert_eq!(
        service.decode::<Peer>(&headers),
        Err(TokenError::Unauthorized)
    );
    assert!(policy.validate_calls().is_empty());

    // A non-bearer opaque value is passed over like any other scheme
    let headers = raw_authorization_headers(&[b"Basic \xff", valid.as_bytes()]);
    assert_eq!(service.decode::<Peer>(&headers), Ok(peer("peerA", "test")));
}

#[test]
fn test_decode_rejects_oversized_token() {
    let service = service_with(SenderPolicy::Open);
    let padding = "a".repeat(MAX_JWT_SIZE_BYTES);
    let oversized = ServiceToken::new("peerA", "test", Duration::from_secs(60)).with_scope(padding);

    let headers = authorization_headers(&[&bearer_for(&oversized, "Bearer")]);
    assert_eq!(
        service.decode::<ServiceToken>(&headers),
        Err(TokenError::Unauthorized)
    );
}

// ============================================================================
// Decode: payload self-consistency
// ============================================================================

#[test]
fn test_decode_rejects_expired_token() {
    let service = service_with(SenderPolicy::Open);
    let jwt = TestTokenBuilder::new()
        .from("peerA")
        .expired()
        .bearer(&test_hs256_signer());

    assert_eq!(
        service.decode::<ServiceToken>(&authorization_headers(&[&jwt])),
        Err(TokenError::Unauthorized)
    );
}

#[test]
fn test_decode_rejects_token_issued_far_in_future() {
    let service = service_with(SenderPolicy::Open);
    let future = chrono::Utc::now().timestamp() + 3600;
    let jwt = TestTokenBuilder::new()
        .from("peerA")
        .issued_at(future)
        .expires_in(7200)
        .bearer(&test_hs256_signer());

    assert_eq!(
        service.decode::<ServiceToken>(&authorization_headers(&[&jwt])),
        Err(TokenError::Unauthorized)
    );
}

#[test]
fn test_decode_accepts_small_clock_skew() {
    let service = service_with(SenderPolicy::Open);
    let slightly_ahead = chrono::Utc::now().timestamp() + 60;
    let jwt = TestTokenBuilder::new()
        .from("peerA")
        .issued_at(slightly_ahead)
        .bearer(&test_hs256_signer());

    assert!(service
        .decode::<ServiceToken>(&authorization_headers(&[&jwt]))
        .is_ok());
}

#[test]
fn test_decode_rejects_empty_sender_claim() {
    let service = service_with(SenderPolicy::Open);
    let jwt = TestTokenBuilder::new().from("").bearer(&test_hs256_signer());

    assert_eq!(
        service.decode::<ServiceToken>(&authorization_headers(&[&jwt])),
        Err(TokenError::Unauthorized)
    );
}

#[test]
fn test_decode_rejects_payload_of_wrong_shape() {
    let service = service_with(SenderPolicy::Open);
    let jwt = JwtSigner::hs256(TEST_SECRET)
        .sign(&serde_json::json!({"sender": "peerA", "audience": "test"}))
        .unwrap();

    assert_eq!(
        service.decode_token::<Peer>(&jwt),
        Err(TokenError::Unauthorized)
    );
}

// ============================================================================
// Encode
// ============================================================================

#[test]
fn test_encode_passes_own_identifier_to_factory() {
    let policy = FakeTrustPolicy::new().with_key("billing", test_hs256_signer());
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");

    let mut seen = None;
    let bytes = service
        .encode(|from| {
            seen = Some(from.to_string());
            ServiceToken::new(from, "billing", Duration::from_secs(60)).with_scope("jobs:write")
        })
        .unwrap();

    assert_eq!(seen.as_deref(), Some("test"));
    assert_eq!(policy.key_calls(), vec!["billing"]);

    String::from_utf8(bytes)
        .unwrap()
        .assert_valid_jwt("HS256")
        .assert_from("test")
        .assert_to("billing")
        .assert_has_scope("jobs:write")
        .assert_expires_in(60);
}

#[test]
fn test_encode_missing_recipient_key_is_forbidden() {
    let policy = FakeTrustPolicy::new().with_key("billing", test_hs256_signer());
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy.clone()), "test");

    for recipient in ["ledger", "Billing", ""] {
        assert_eq!(
            service.encode(|from| peer(from, recipient)),
            Err(TokenError::Forbidden)
        );
    }
    assert_eq!(policy.key_calls(), vec!["ledger", "Billing", ""]);
}

#[test]
fn test_encode_stamps_key_id() {
    let signer = test_ed25519_signer(1).unwrap().with_key_id("billing-2026-10");
    let policy = StaticTrustPolicy::open([("billing", signer)]);
    let service = TokenService::new(test_hs256_signer(), Arc::new(policy), "test");

    let bytes = service.encode(|from| peer(from, "billing")).unwrap();
    String::from_utf8(bytes)
        .unwrap()
        .assert_valid_jwt("EdDSA")
        .assert_signed_by("billing-2026-10");
}

// ============================================================================
// Service to service
// ============================================================================

#[test]
fn test_issued_token_is_accepted_by_recipient() {
    // billing signs with the private half; ledger verifies with the public half
    let billing = TokenService::new(
        test_ed25519_verifier(2).unwrap(),
        Arc::new(StaticTrustPolicy::open([(
            "ledger",
            test_ed25519_signer(1).unwrap(),
        )])),
        "billing",
    );
    let ledger = TokenService::new(
        test_ed25519_verifier(1).unwrap(),
        Arc::new(StaticTrustPolicy::allow_list(
            Vec::<(String, JwtSigner)>::new(),
            ["billing"],
        )),
        "ledger",
    );

    let bytes = billing
        .encode(|from| ServiceToken::new(from, "ledger", Duration::from_secs(60)))
        .unwrap();
    let jwt = String::from_utf8(bytes).unwrap();

    let received: ServiceToken = ledger
        .decode(&authorization_headers(&[&format!("Bearer {jwt}")]))
        .unwrap();
    assert_eq!(received.from, "billing");
    assert_eq!(received.to, "ledger");

    // The token is not valid for anyone else, including its issuer
    assert_eq!(
        billing.decode_token::<ServiceToken>(&jwt),
        Err(TokenError::Unauthorized)
    );
}

#[test]
fn test_service_shared_across_threads() {
    let service = Arc::new(service_with(SenderPolicy::allow(["peerA"])));
    let headers = authorization_headers(&[&bearer_for(&peer("peerA", "test"), "Bearer")]);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let headers = headers.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    assert_eq!(service.decode::<Peer>(&headers), Ok(peer("peerA", "test")));
                }
            });
        }
    });
}
