//! Wire envelope tests through the public API.

use chatwatch::gateway::{InboundMessage, IngestPayload, MessageRef, OutboundEnvelope, Snowflake};
use serde_json::{json, Value};

#[test]
fn test_ingest_envelope_shape() {
    let target = MessageRef::new("u-1", 4u64, "c-2", 3u64);
    let frame = OutboundEnvelope::MessageIngest(IngestPayload::new("buy cheap gold", &target))
        .to_frame()
        .unwrap();

    let parsed: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(
        parsed,
        json!({
            "event": "message_ingest",
            "data": {
                "guild": 3,
                "channel": "c-2",
                "user": "u-1",
                "message_id": 4,
                "message": "buy cheap gold"
            }
        })
    );
}

#[test]
fn test_ingest_escapes_content() {
    let target = MessageRef::new(1u64, 2u64, 3u64, 4u64);
    let content = "line one\n\"quoted\" \u{1F600}";
    let frame = OutboundEnvelope::MessageIngest(IngestPayload::new(content, &target))
        .to_frame()
        .unwrap();

    let parsed: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["data"]["message"], content);
}

#[test]
fn test_inbound_classification() {
    let cases = [
        (r#"{"event":"connection","data":"ok"}"#, true),
        (r#"{"event":"connection","data":"OK"}"#, false),
        (r#"{"event":"connection","data":{"status":"ok"}}"#, false),
        (r#"{"event":"message_response","data":"ok"}"#, false),
    ];

    for (frame, ready) in cases {
        let message = InboundMessage::parse(frame).unwrap();
        assert_eq!(message.is_ready(), ready, "{}", frame);
    }
}

#[test]
fn test_snowflake_display() {
    assert_eq!(Snowflake::from(180000000000000001u64).to_string(), "180000000000000001");
    assert_eq!(Snowflake::from("abc").to_string(), "abc");
}
