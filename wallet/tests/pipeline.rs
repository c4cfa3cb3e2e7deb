mod common;

use common::{identity, key, BroadcastMode, FakeNode, FakeSigner, SignerMode};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;
use tickwire_common::{
    codec::{DecodeResult, Heuristic, ParameterCodec, Payload, Value},
    config::{SIGNATURE_SIZE, TRANSACTION_HEADER_SIZE},
    crypto::PublicKey,
    error::ValidationError,
    schema::ContractSchema,
};
use tickwire_wallet::{
    confirmation::{ConfirmationPipeline, ConfirmationState},
    error::{ErrorKind, SigningError, WalletError},
    session::WalletSession,
};

const TICK: u32 = 15_000_000;

const SCHEMA: &str = r#"{
    "name": "Exchange",
    "contractIndex": 1,
    "procedures": [
        {
            "name": "TransferShares",
            "index": 2,
            "fee": 100,
            "inputs": [
                { "name": "newOwner", "type": "id" },
                { "name": "assetName", "type": "uint64" },
                { "name": "shares", "type": "sint64" }
            ]
        }
    ],
    "functions": [
        {
            "name": "Fees",
            "index": 1,
            "outputs": [
                { "name": "assetIssuanceFee", "type": "uint32" },
                { "name": "transferFee", "type": "uint32" },
                { "name": "tradeFee", "type": "uint32" }
            ]
        },
        { "name": "Raw", "index": 7 }
    ]
}"#;

struct Fixture {
    node: Arc<FakeNode>,
    signer: Arc<FakeSigner>,
    session: WalletSession,
}

fn fixture() -> Fixture {
    let node = Arc::new(FakeNode::new(TICK));
    let signer = Arc::new(FakeSigner::new(key(1)));
    let session = WalletSession::new(
        node.clone(),
        signer.clone(),
        ParameterCodec::default(),
        10,
    );
    Fixture {
        node,
        signer,
        session,
    }
}

fn params(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_transfer_settles() {
    let f = fixture();
    let pending = f
        .session
        .prepare_transfer(&identity(2), "1000000000000")
        .await
        .unwrap();
    assert_eq!(f.session.pipeline().state(), ConfirmationState::AwaitingApproval);
    assert!(f.session.pipeline().is_busy());

    let summary = pending.summary().unwrap().clone();
    assert_eq!(summary.destination, identity(2));
    assert_eq!(summary.amount, 1_000_000_000_000);
    assert_eq!(summary.observed_tick, TICK);
    assert_eq!(summary.target_tick, TICK + 10);
    // Nothing signed before approval
    assert_eq!(f.signer.calls(), 0);

    let receipt = pending.approve().await.unwrap();
    assert_eq!(receipt.tx_id, "tx-1");
    assert_eq!(receipt.target_tick, TICK + 10);
    assert_eq!(
        f.session.pipeline().state(),
        ConfirmationState::Settled {
            tx_id: "tx-1".to_owned()
        }
    );
    assert!(!f.session.pipeline().is_busy());

    // Full buffer went to the signer, its signature was broadcast
    assert_eq!(f.signer.last_len(), TRANSACTION_HEADER_SIZE + SIGNATURE_SIZE);
    let broadcasts = f.node.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].signature(), &[0xAB; SIGNATURE_SIZE]);
    assert_eq!(broadcasts[0].transaction().amount(), 1_000_000_000_000);
    assert_eq!(broadcasts[0].transaction().destination(), &key(2));
}

#[tokio::test]
async fn test_malformed_address_makes_no_call() {
    let f = fixture();
    let mut address = identity(2);
    address.make_ascii_lowercase();

    let err = f.session.prepare_transfer(&address, "10").await.unwrap_err();
    match err {
        WalletError::Validation(e) => assert_eq!(e.field(), "destination"),
        other => panic!("unexpected error {}", other),
    }
    let err = f.session.prepare_transfer("SHORT", "10").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(f.node.calls(), 0);
    assert_eq!(f.session.pipeline().state(), ConfirmationState::Idle);
}

#[tokio::test]
async fn test_bad_amount_makes_no_call() {
    let f = fixture();
    let err = f.session.prepare_transfer(&identity(2), "-5").await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Validation(ValidationError::NegativeAmount { amount: -5, .. })
    ));

    let err = f
        .session
        .prepare_transfer(&identity(2), "9223372036854775808")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::Validation(ValidationError::OutOfRange { .. })
    ));
    assert_eq!(f.node.calls(), 0);
}

#[tokio::test]
async fn test_second_request_is_busy() {
    let f = fixture();
    let pending = f.session.prepare_transfer(&identity(2), "1").await.unwrap();
    let err = f
        .session
        .prepare_transfer(&identity(3), "2")
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::PipelineBusy));
    assert_eq!(err.kind(), ErrorKind::Busy);

    // The pending draft is untouched by the rejected request
    assert_eq!(pending.summary().unwrap().destination, identity(2));

    pending.cancel();
    assert_eq!(f.session.pipeline().state(), ConfirmationState::Rejected);
    assert_eq!(f.signer.calls(), 0);
    assert!(f.session.prepare_transfer(&identity(3), "2").await.is_ok());
}

#[tokio::test]
async fn test_dropped_confirmation_is_rejected() {
    let f = fixture();
    let mut states = f.session.pipeline().subscribe();
    {
        let _pending = f.session.prepare_transfer(&identity(2), "1").await.unwrap();
    }
    assert_eq!(*states.borrow_and_update(), ConfirmationState::Rejected);
    assert!(!f.session.pipeline().is_busy());
    assert!(f.node.broadcasts().is_empty());
}

#[tokio::test]
async fn test_signer_failures_never_broadcast() {
    for (mode, expected) in [
        (SignerMode::Truncated, "WrongLength"),
        (SignerMode::Tampering, "AlteredContent"),
        (SignerMode::Failing, "Capability"),
    ] {
        let f = fixture();
        f.signer.set_mode(mode);
        let pending = f.session.prepare_transfer(&identity(2), "1").await.unwrap();
        let err = pending.approve().await.unwrap_err();

        let name = match &err {
            WalletError::Signing(SigningError::WrongLength { expected, actual }) => {
                assert_eq!(*expected, actual + 1);
                "WrongLength"
            }
            WalletError::Signing(SigningError::AlteredContent) => "AlteredContent",
            WalletError::Signing(SigningError::Capability(_)) => "Capability",
            other => panic!("unexpected error {}", other),
        };
        assert_eq!(name, expected);
        assert!(matches!(
            f.session.pipeline().state(),
            ConfirmationState::Failed { .. }
        ));
        assert!(f.node.broadcasts().is_empty());
        // Only the tick was fetched
        assert_eq!(f.node.calls(), 1);
    }
}

#[tokio::test]
async fn test_broadcast_failures() {
    for mode in [BroadcastMode::ServerError, BroadcastMode::MissingId] {
        let f = fixture();
        f.node.set_mode(mode);
        let pending = f.session.prepare_transfer(&identity(2), "1").await.unwrap();
        let err = pending.approve().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);

        match f.session.pipeline().state() {
            ConfirmationState::Failed { reason } => assert_eq!(reason, err.to_string()),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(!f.session.pipeline().is_busy());
    }
}

#[tokio::test]
async fn test_invocation_uses_schema() {
    let f = fixture();
    let schema = ContractSchema::from_json(SCHEMA).unwrap();
    let values = params(json!({
        "newOwner": identity(4),
        "assetName": "5127011",
        "shares": 250
    }));

    let pending = f
        .session
        .prepare_invocation(&schema, "TransferShares", &values, None)
        .await
        .unwrap();
    let tx = pending.transaction().unwrap();
    assert_eq!(tx.destination(), &PublicKey::contract(1));
    assert_eq!(tx.contract_index(), Some(1));
    assert_eq!(tx.selector(), 2);
    // Procedure fee is attached by default
    assert_eq!(tx.amount(), 100);
    assert_eq!(tx.payload().size(), 32 + 8 + 8);

    let summary = pending.summary().unwrap();
    assert_eq!(summary.destination, "contract #1");
    assert_eq!(summary.label.as_deref(), Some("Exchange.TransferShares"));
    assert_eq!(
        summary.parameters,
        Some(json!({
            "newOwner": identity(4),
            "assetName": "5127011",
            "shares": "250"
        }))
    );

    let receipt = pending.approve().await.unwrap();
    assert_eq!(receipt.target_tick, TICK + 10);
    assert_eq!(f.signer.last_len(), TRANSACTION_HEADER_SIZE + 48 + SIGNATURE_SIZE);
}

#[tokio::test]
async fn test_invocation_validation_precedes_network() {
    let f = fixture();
    let schema = ContractSchema::from_json(SCHEMA).unwrap();

    let err = f
        .session
        .prepare_invocation(&schema, "Burn", &Map::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let values = params(json!({ "newOwner": identity(4), "assetName": "-1", "shares": 1 }));
    let err = f
        .session
        .prepare_invocation(&schema, "TransferShares", &values, Some("0"))
        .await
        .unwrap_err();
    match err {
        WalletError::Validation(e) => assert_eq!(e.field(), "assetName"),
        other => panic!("unexpected error {}", other),
    }
    assert_eq!(f.node.calls(), 0);
}

#[tokio::test]
async fn test_query_decodes_outputs() {
    let f = fixture();
    let schema = ContractSchema::from_json(SCHEMA).unwrap();
    let mut response = Vec::new();
    for fee in [1_000_000u32, 1_000, 5_000] {
        response.extend_from_slice(&fee.to_le_bytes());
    }
    f.node.set_response(response);

    let result = f.session.query(&schema, "Fees", &Map::new()).await.unwrap();
    match result {
        DecodeResult::Typed(decoded) => {
            assert_eq!(decoded.get("assetIssuanceFee"), Some(&Value::U32(1_000_000)));
            assert_eq!(decoded.get("tradeFee"), Some(&Value::U32(5_000)));
            assert_eq!(decoded.trailing_bytes, 0);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(f.node.queries(), vec![(1, 1, 0)]);
}

#[tokio::test]
async fn test_query_without_outputs_falls_back() {
    let f = fixture();
    let schema = ContractSchema::from_json(SCHEMA).unwrap();
    f.node.set_response(42u64.to_le_bytes().to_vec());

    let result = f.session.query(&schema, "Raw", &Map::new()).await.unwrap();
    match result {
        DecodeResult::RawFallback(raw) => {
            assert_eq!(
                raw.guess,
                Heuristic::Integer64 {
                    unsigned: 42,
                    signed: 42
                }
            );
            assert_eq!(raw.byte_length, 8);
        }
        other => panic!("unexpected result {:?}", other),
    }

    // Short typed response is a protocol error, not a panic
    f.node.set_response(vec![1, 2, 3]);
    let err = f.session.query(&schema, "Fees", &Map::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);

    // Without outputs the same bytes are only labeled
    let raw = f
        .session
        .queries()
        .query_raw(9, 3, &Payload::new(vec![1, 2]), None)
        .await
        .unwrap();
    assert!(!raw.is_typed());
    assert_eq!(raw.byte_length(), 3);
    assert_eq!(f.node.queries().last(), Some(&(9, 3, 2)));
}

#[tokio::test]
async fn test_pipelines_are_independent() {
    let node = Arc::new(FakeNode::new(7));
    let signer = Arc::new(FakeSigner::new(key(9)));
    let pipeline = ConfirmationPipeline::new(node.clone(), signer);
    let session = WalletSession::new(
        node,
        Arc::new(FakeSigner::new(key(9))),
        ParameterCodec::default(),
        5,
    );

    // Session and standalone pipelines are independent
    let pending = session.prepare_transfer(&identity(1), "3").await.unwrap();
    let tx = pending.transaction().unwrap().clone();
    let summary = pending.summary().unwrap().clone();
    let _second = pipeline.request(tx, summary).unwrap();
    assert_eq!(pipeline.state(), ConfirmationState::AwaitingApproval);
    assert_eq!(session.pipeline().state(), ConfirmationState::AwaitingApproval);
}
