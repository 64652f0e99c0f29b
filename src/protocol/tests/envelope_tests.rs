//! Tests for envelope versioning and message shapes.

use crate::capability::domain::{CallId, PageInstanceId};
use crate::protocol::{BridgeMessage, CURRENT_PROTOCOL_VERSION, Envelope, PageDirective, ProtocolError};
use rstest::rstest;
use serde_json::{Map, json};

#[rstest]
fn execute_request_uses_wire_field_names() {
    let message = BridgeMessage::ExecuteToolRequest {
        tab_id: PageInstanceId::from(42),
        tool_name: "get_user_profile".to_owned(),
        args: Map::new(),
        call_id: CallId::new("call-1").expect("valid call id"),
    };

    let value = serde_json::to_value(Envelope::new(message)).expect("serialisable envelope");

    assert_eq!(
        value,
        json!({
            "version": 1,
            "message": {
                "type": "EXECUTE_TOOL_REQUEST",
                "tabId": "42",
                "toolName": "get_user_profile",
                "args": {},
                "callId": "call-1"
            }
        })
    );
}

#[rstest]
fn unsupported_version_is_rejected() {
    let json = r#"{"version": 2, "message": {"type": "ACK"}}"#;
    let envelope = Envelope::<BridgeMessage>::decode(json).expect("well-formed envelope");

    let result = envelope.open(CURRENT_PROTOCOL_VERSION);

    assert!(matches!(
        result,
        Err(ProtocolError::UnsupportedVersion { found: 2, supported: 1 })
    ));
}

#[rstest]
#[case(r#"{"version": 1, "message": {"type": "NOT_A_MESSAGE"}}"#)]
#[case(r#"{"version": 1, "message": {"type": "GET_TOOLS_FOR_TAB"}}"#)]
#[case("not json")]
fn malformed_envelopes_fail_to_decode(#[case] json: &str) {
    assert!(matches!(
        Envelope::<BridgeMessage>::decode(json),
        Err(ProtocolError::Malformed(_))
    ));
}

#[rstest]
#[case(r#"{"version": 1, "message": {"type": "GET_TOOLS_FOR_TAB", "tabId": ""}}"#)]
#[case(r#"{"version": 1, "message": {"type": "EXECUTE_TOOL_REQUEST", "tabId": "42", "toolName": "a", "args": {}, "callId": "   "}}"#)]
#[case(r#"{"version": 1, "message": {"type": "PAGE_CLOSED", "tabId": "  "}}"#)]
fn blank_identifiers_fail_to_decode(#[case] json: &str) {
    assert!(matches!(
        Envelope::<BridgeMessage>::decode(json),
        Err(ProtocolError::Malformed(_))
    ));
}

#[rstest]
fn padded_identifiers_decode_trimmed() {
    let json = r#"{"version": 1, "message": {"type": "GET_TOOLS_FOR_TAB", "tabId": " 42 "}}"#;
    let message = Envelope::<BridgeMessage>::decode(json)
        .expect("well-formed envelope")
        .open(CURRENT_PROTOCOL_VERSION)
        .expect("supported version");

    assert_eq!(
        message,
        BridgeMessage::GetToolsForTab {
            tab_id: PageInstanceId::from(42)
        }
    );
}

#[rstest]
fn blank_announced_tool_fails_validation() {
    let json = r#"{"version": 1, "message": {"type": "NEW_TOOL_AVAILABLE", "tool": {"name": "  "}}}"#;
    let message = Envelope::<BridgeMessage>::decode(json)
        .expect("well-formed envelope")
        .open(CURRENT_PROTOCOL_VERSION)
        .expect("supported version");

    assert!(matches!(
        message.validate(),
        Err(ProtocolError::InvalidPayload(_))
    ));
}

#[rstest]
fn read_request_splits_into_page_directive() {
    let message = BridgeMessage::ReadResourceRequest {
        tab_id: PageInstanceId::from(3),
        resource_name: "user_context".to_owned(),
        call_id: CallId::new("read-1").expect("valid call id"),
    };

    let (page, directive) = PageDirective::from_request(message).expect("request message");

    assert_eq!(page, PageInstanceId::from(3));
    assert_eq!(directive.name(), "user_context");
    assert_eq!(directive.call_id().as_str(), "read-1");
}

#[rstest]
fn non_request_message_is_not_a_directive() {
    let result = PageDirective::from_request(BridgeMessage::Ack);

    assert!(matches!(result, Err(ProtocolError::UnexpectedMessage("ACK"))));
}
