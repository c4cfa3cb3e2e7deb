use crate::{
    codec::{ParameterCodec, Payload},
    config::{
        AMOUNT_OFFSET, DESTINATION_OFFSET, PAYLOAD_SIZE_OFFSET, SELECTOR_OFFSET, SIGNATURE_SIZE,
        SOURCE_OFFSET, TICK_OFFSET_IN_HEADER, TRANSACTION_HEADER_SIZE,
    },
    crypto::{IdentityCodec, PublicKey, StandardIdentityCodec},
    error::{ProtocolError, ValidationError},
    schema::{FieldDescriptor, TypeTag},
    serializer::Serializer,
    tick::TickWindow,
    transaction::*,
};

fn source() -> PublicKey {
    PublicKey::new([0x11; 32])
}

fn window() -> TickWindow {
    TickWindow::new(15_000_000, 10)
}

fn sample_invocation(payload: Vec<u8>) -> UnsignedTransaction {
    build_invocation(source(), 4, 2, 1_000, &window(), Payload::new(payload)).unwrap()
}

#[test]
fn test_invocation_layout() {
    let tx = sample_invocation(vec![0xAA, 0xBB, 0xCC]);
    let buffer = tx.to_unsigned_buffer();
    assert_eq!(buffer.len(), TRANSACTION_HEADER_SIZE + 3 + SIGNATURE_SIZE);

    assert_eq!(&buffer[SOURCE_OFFSET..DESTINATION_OFFSET], source().as_bytes());
    assert_eq!(buffer[DESTINATION_OFFSET], 4);
    assert!(buffer[DESTINATION_OFFSET + 1..AMOUNT_OFFSET].iter().all(|b| *b == 0));
    assert_eq!(&buffer[AMOUNT_OFFSET..TICK_OFFSET_IN_HEADER], &1_000i64.to_le_bytes());
    assert_eq!(&buffer[TICK_OFFSET_IN_HEADER..SELECTOR_OFFSET], &15_000_010u32.to_le_bytes());
    assert_eq!(&buffer[SELECTOR_OFFSET..PAYLOAD_SIZE_OFFSET], &2u16.to_le_bytes());
    assert_eq!(&buffer[PAYLOAD_SIZE_OFFSET..TRANSACTION_HEADER_SIZE], &3u16.to_le_bytes());
    assert_eq!(&buffer[80..83], &[0xAA, 0xBB, 0xCC]);
    assert!(buffer[83..].iter().all(|b| *b == 0));
    assert_eq!(tx.contract_index(), Some(4));
}

#[test]
fn test_buffer_size_for_any_payload() {
    for size in [0usize, 1, 8, 255, 4096, u16::MAX as usize] {
        let tx = sample_invocation(vec![1; size]);
        assert_eq!(tx.to_unsigned_buffer().len(), 80 + size + SIGNATURE_SIZE);
        assert_eq!(tx.payload_size() as usize, size);
    }
}

#[test]
fn test_every_contract_selector_is_zero_padded() {
    for contract in 0..=u8::MAX {
        let tx = build_invocation(source(), contract, 1, 0, &window(), Payload::empty()).unwrap();
        let buffer = tx.to_unsigned_buffer();
        let mut expected = [0u8; 32];
        expected[0] = contract;
        assert_eq!(&buffer[32..64], &expected);
    }
}

#[test]
fn test_transfer_keeps_large_amount_exact() {
    let destination = PublicKey::new([0x22; 32]);
    let tx = build_transfer(source(), destination, 1_000_000_000_000, &window()).unwrap();
    let buffer = tx.to_unsigned_buffer();
    assert_eq!(
        &buffer[AMOUNT_OFFSET..TICK_OFFSET_IN_HEADER],
        &[0x00, 0x10, 0xA5, 0xD4, 0xE8, 0x00, 0x00, 0x00]
    );
    assert_eq!(tx.selector(), 0);
    assert_eq!(tx.payload_size(), 0);
    assert_eq!(buffer.len(), 80 + SIGNATURE_SIZE);
    assert_eq!(tx.contract_index(), None);
}

#[test]
fn test_builder_validation() {
    let err = build_transfer(source(), source(), -1, &window()).unwrap_err();
    assert_eq!(
        err,
        ValidationError::NegativeAmount { field: "amount".to_owned(), amount: -1 }
    );

    // Zero is a valid amount for pure calls
    assert!(build_invocation(source(), 1, 1, 0, &window(), Payload::empty()).is_ok());

    let stale = TickWindow { observed_tick: 100, target_tick: 100 };
    let err = build_invocation(source(), 1, 1, 0, &stale, Payload::empty()).unwrap_err();
    assert!(matches!(err, ValidationError::StaleTick { .. }));

    let err = build_invocation(
        source(),
        1,
        1,
        0,
        &window(),
        Payload::new(vec![0; u16::MAX as usize + 1]),
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::PayloadTooLarge { .. }));
}

#[test]
fn test_attach_signed_buffer() {
    let tx = sample_invocation(vec![5, 6]);
    let mut signed = tx.to_unsigned_buffer();
    let boundary = signed.len() - SIGNATURE_SIZE;
    signed[boundary..].copy_from_slice(&[0x5A; SIGNATURE_SIZE]);

    let result = tx.clone().attach_signed_buffer(&signed).unwrap();
    assert_eq!(result.signature(), &[0x5A; SIGNATURE_SIZE]);
    assert_eq!(result.to_bytes(), signed);

    let err = tx.clone().attach_signed_buffer(&signed[..signed.len() - 1]).unwrap_err();
    assert_eq!(
        err,
        AttachError::WrongLength { expected: signed.len(), actual: signed.len() - 1 }
    );

    let mut altered = signed.clone();
    altered[AMOUNT_OFFSET] ^= 0xFF;
    assert_eq!(tx.attach_signed_buffer(&altered), Err(AttachError::AlteredContent));
}

#[test]
fn test_inspect_transaction() {
    let tx = sample_invocation(vec![9; 16]);

    let (parsed, signature) = inspect_transaction(&tx.to_unsigned_buffer()).unwrap();
    assert_eq!(parsed, tx);
    assert_eq!(signature, None);

    let (parsed, signature) = inspect_transaction(&tx.signing_bytes()).unwrap();
    assert_eq!(parsed, tx);
    assert_eq!(signature, None);

    let signed = tx.clone().with_signature([1; SIGNATURE_SIZE]);
    let (_, signature) = inspect_transaction(&signed.to_bytes()).unwrap();
    assert_eq!(signature, Some([1; SIGNATURE_SIZE]));

    let err = inspect_transaction(&[0; 40]).unwrap_err();
    assert_eq!(err, ProtocolError::TransactionTooShort { len: 40, min: 80 });

    let mut truncated = tx.signing_bytes();
    truncated.truncate(90);
    let err = inspect_transaction(&truncated).unwrap_err();
    assert_eq!(err, ProtocolError::PayloadSizeMismatch { declared: 16, actual: 10 });

    let mut extra = tx.signing_bytes();
    extra.extend_from_slice(&[0; 3]);
    let err = inspect_transaction(&extra).unwrap_err();
    assert!(matches!(err, ProtocolError::PayloadSizeMismatch { .. }));
}

#[test]
fn test_summary_from_encoded_parameters() {
    let codec = ParameterCodec::default();
    let schema = [FieldDescriptor::new("amount", TypeTag::U64)];
    let values = serde_json::json!({ "amount": "1000000" });
    let payload = codec.encode(values.as_object().unwrap(), &schema).unwrap();
    let tx = build_invocation(source(), 1, 6, 0, &window(), payload.clone()).unwrap();

    let preview = codec.decode(payload.as_bytes(), &schema).unwrap();
    let summary = TransactionSummary::new(&tx, &window(), &StandardIdentityCodec)
        .with_label("IssueAsset")
        .with_parameters(preview.to_json(&StandardIdentityCodec)["fields"].clone());

    assert_eq!(summary.source, StandardIdentityCodec.encode_identity(&source()));
    assert_eq!(summary.destination, "contract #1");
    assert_eq!(summary.target_tick, 15_000_010);
    let text = summary.to_string();
    assert!(text.contains("IssueAsset (6)"));
    assert!(text.contains("\"1000000\""));
}
