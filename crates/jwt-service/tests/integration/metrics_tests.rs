//! Integration tests for decode/encode counters
//!
//! Rejection reasons surface only as metric labels, never to callers.

use jwt_service::{JwtSigner, ServiceToken, StaticTrustPolicy, TokenService};
use jwt_service_test_utils::{authorization_headers, TestTokenBuilder, TEST_SECRET};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::CompositeKey;
use std::sync::Arc;
use std::time::Duration;

type Snapshot = Vec<(
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

fn counter(snapshot: &Snapshot, name: &str, status: &str, reason: &str) -> u64 {
    snapshot
        .iter()
        .find_map(|(key, _, _, value)| {
            let key = key.key();
            let labels: Vec<(String, String)> = key
                .labels()
                .map(|l| (l.key().to_string(), l.value().to_string()))
                .collect();
            let matches = key.name() == name
                && labels.contains(&("status".to_string(), status.to_string()))
                && labels.contains(&("reason".to_string(), reason.to_string()));
            match (matches, value) {
                (true, DebugValue::Counter(count)) => Some(*count),
                _ => None,
            }
        })
        .unwrap_or(0)
}

fn service() -> TokenService {
    let policy = StaticTrustPolicy::allow_list(
        [("billing", JwtSigner::hs256(TEST_SECRET))],
        ["billing"],
    );
    TokenService::new(JwtSigner::hs256(TEST_SECRET), Arc::new(policy), "test")
}

#[test]
fn test_decode_outcomes_are_counted_by_reason() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let service = service();
    let signer = JwtSigner::hs256(TEST_SECRET);

    metrics::with_local_recorder(&recorder, || {
        let cases = [
            vec![],
            vec!["Token abc".to_string()],
            vec!["Bearer not-a-jwt".to_string()],
            vec![TestTokenBuilder::new()
                .from("billing")
                .expired()
                .bearer(&signer)],
            vec![TestTokenBuilder::new()
                .from("billing")
                .to("audit")
                .bearer(&signer)],
            vec![TestTokenBuilder::new().from("mallory").bearer(&signer)],
            vec![TestTokenBuilder::new().from("billing").bearer(&signer)],
        ];

        for values in &cases {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            let _ = service.decode::<ServiceToken>(&authorization_headers(&values));
        }
    });

    let snapshot = snapshotter.snapshot().into_vec();
    for reason in [
        "missing_header",
        "not_bearer",
        "invalid_token",
        "invalid_payload",
        "wrong_audience",
        "untrusted_sender",
    ] {
        assert_eq!(
            counter(&snapshot, "jwt_service_decode_total", "error", reason),
            1,
            "reason {reason}"
        );
    }
    assert_eq!(
        counter(&snapshot, "jwt_service_decode_total", "success", "none"),
        1
    );
}

#[test]
fn test_encode_outcomes_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let service = service();

    metrics::with_local_recorder(&recorder, || {
        for recipient in ["billing", "billing", "ledger"] {
            let _ = service
                .encode(|from| ServiceToken::new(from, recipient, Duration::from_secs(60)));
        }
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&snapshot, "jwt_service_encode_total", "success", "none"),
        2
    );
    assert_eq!(
        counter(&snapshot, "jwt_service_encode_total", "error", "missing_key"),
        1
    );
}
